use std::future::Future;

use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::person::{Person, PersonId, PersonPayload};
use crate::{PhonebookError, Result};

// path of the persons collection on the server
const PERSONS_PATH: &str = "/api/persons";

/// The calls the client state controller makes against the phonebook REST API.
///
/// [`HttpPersonService`] talks to a real [`PhonebookServer`]; tests substitute their own
/// implementation.
///
/// [`PhonebookServer`]: ./struct.PhonebookServer.html
pub trait PersonService {
    /// fetches every stored record
    fn get_all(&self) -> impl Future<Output = Result<Vec<Person>>> + Send;

    /// creates a record, returning it with its server assigned id
    fn create(&self, payload: &PersonPayload) -> impl Future<Output = Result<Person>> + Send;

    /// replaces the record with the given `id`
    fn update(&self, id: PersonId, payload: &PersonPayload) -> impl Future<Output = Result<Person>> + Send;

    /// deletes the record with the given `id`
    fn delete(&self, id: PersonId) -> impl Future<Output = Result<()>> + Send;
}

/// `HttpPersonService` contains the functionality for communication with a [`PhonebookServer`]
/// over HTTP
///
/// [`PhonebookServer`]: ./struct.PhonebookServer.html
#[derive(Debug, Clone)]
pub struct HttpPersonService {
    base_url: Url,
    client: Client,
}

impl HttpPersonService {
    /// creates a service that sends its requests to the server at `base_url`,
    /// e.g. `http://127.0.0.1:3001`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PhonebookError::Parsing(format!("could not parse {} into a url: {}", base_url, e)))?;
        let client = Client::builder().build()?;
        Ok(HttpPersonService { base_url, client })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PhonebookError::Parsing(format!("invalid request path {}: {}", path, e)))
    }

    fn member_url(&self, id: PersonId) -> Result<Url> {
        self.url(&format!("{}/{}", PERSONS_PATH, id))
    }

    /// fetches the server's `/info` page
    pub async fn info(&self) -> Result<String> {
        let rsp = self.client.get(self.url("/info")?).send().await?;
        Ok(check_status(rsp).await?.text().await?)
    }
}

impl PersonService for HttpPersonService {
    async fn get_all(&self) -> Result<Vec<Person>> {
        let rsp = self.client.get(self.url(PERSONS_PATH)?).send().await?;
        Ok(check_status(rsp).await?.json().await?)
    }

    async fn create(&self, payload: &PersonPayload) -> Result<Person> {
        let rsp = self.client.post(self.url(PERSONS_PATH)?).json(payload).send().await?;
        Ok(check_status(rsp).await?.json().await?)
    }

    async fn update(&self, id: PersonId, payload: &PersonPayload) -> Result<Person> {
        let rsp = self.client.put(self.member_url(id)?).json(payload).send().await?;
        Ok(check_status(rsp).await?.json().await?)
    }

    async fn delete(&self, id: PersonId) -> Result<()> {
        let rsp = self.client.delete(self.member_url(id)?).send().await?;
        check_status(rsp).await?;
        Ok(())
    }
}

/// passes successful responses through, and turns any other into a
/// [`PhonebookError::Remote`] carrying the server's message
async fn check_status(rsp: Response) -> Result<Response> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    let status = rsp.status();
    if status.is_success() {
        return Ok(rsp);
    }

    let text = rsp.text().await?;
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) => text,
    };
    Err(PhonebookError::Remote {
        status: status.as_u16(),
        message,
    })
}
