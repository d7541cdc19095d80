//! Blocking HTTP implementation of [`HnSource`].

use crate::config::HetlOptions;
use crate::error::HetlError;
use crate::fetch::{HnSource, StoryDescriptor};
use crate::model::{RawItem, RawUser};
use serde::de::DeserializeOwned;

pub struct HnClient {
    client: reqwest::blocking::Client,
    api_base: String,
    site_base: String,
}

impl HnClient {
    pub fn new(opts: &HetlOptions) -> Result<Self, HetlError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(opts.request_timeout)
            .user_agent(concat!("hetl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HetlError::fetch("http client", e))?;
        Ok(Self { client, api_base: opts.api_base.clone(), site_base: opts.site_base.clone() })
    }

    fn get_text(&self, url: &str) -> Result<String, HetlError> {
        let resp = self.client.get(url).send().map_err(|e| HetlError::fetch(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HetlError::fetch(url, format!("HTTP {status}")));
        }
        resp.text().map_err(|e| HetlError::fetch(url, e))
    }

    /// The API answers unknown ids with a literal `null`.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HetlError> {
        let body = self.get_text(url)?;
        let value: Option<T> = serde_json::from_str(&body).map_err(|e| HetlError::fetch(url, e))?;
        value.ok_or_else(|| HetlError::fetch(url, "response was null"))
    }
}

impl HnSource for HnClient {
    fn item(&self, id: u64) -> Result<RawItem, HetlError> {
        self.get_json(&format!("{}/item/{id}.json", self.api_base))
    }

    fn user(&self, username: &str) -> Result<RawUser, HetlError> {
        self.get_json(&format!("{}/user/{username}.json", self.api_base))
    }

    fn story_ids(&self, descriptor: StoryDescriptor) -> Result<Vec<u64>, HetlError> {
        self.get_json(&format!("{}/{descriptor}stories.json", self.api_base))
    }

    fn favorites_page(&self, username: &str) -> Result<String, HetlError> {
        self.get_text(&format!("{}/favorites?id={username}", self.site_base))
    }

    fn page(&self, url: &str) -> Result<String, HetlError> {
        self.get_text(url)
    }
}
