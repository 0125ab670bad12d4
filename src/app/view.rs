//! Text rendering of a [`PhonebookState`], used by the terminal client.
use std::fmt::Write;

use super::state::{Notification, PhonebookState};
use crate::person::Person;

/// draws the whole phonebook: notification, filter, the filtered list
pub fn render(state: &PhonebookState) -> String {
    let mut out = String::from("Phonebook\n");
    if let Some(notification) = &state.notification {
        out.push_str(&render_notification(notification));
        out.push('\n');
    }
    if !state.filter_text.is_empty() {
        let _ = writeln!(out, "filter shown with: {}", state.filter_text);
    }
    out.push_str("Numbers\n");
    for person in state.persons_to_show() {
        out.push_str(&render_person(person));
        out.push('\n');
    }
    out
}

/// one line per person, the id comes last so it can be copied into `rm`
pub fn render_person(person: &Person) -> String {
    format!("{} {} (id {})", person.name, person.number, person.id)
}

/// a notification, tagged with its kind
pub fn render_notification(notification: &Notification) -> String {
    let class = if notification.is_success { "success" } else { "error" };
    format!("[{}] {}", class, notification.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonId;

    #[test]
    fn renders_filtered_persons_and_notification() {
        let state = PhonebookState {
            persons: vec![
                Person { id: PersonId::new(1), name: "Ada".into(), number: "040-1234567".into() },
                Person { id: PersonId::new(2), name: "Bob".into(), number: "09-1234556".into() },
            ],
            filter_text: "a".into(),
            notification: Some(Notification::success("Added Ada")),
            ..Default::default()
        };
        assert_eq!(
            render(&state),
            "Phonebook\n[success] Added Ada\nfilter shown with: a\nNumbers\nAda 040-1234567 (id 1)\n"
        );
    }
}
