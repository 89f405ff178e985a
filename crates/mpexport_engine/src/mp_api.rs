//! Account search and article listing against the MP console endpoints.
//!
//! The endpoints are undocumented. Only `base_resp.ret == 0` is treated as
//! success; any other code is reported verbatim.

use std::sync::Arc;

use mpexport_logging::{mp_debug, mp_info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::HttpClient;
use crate::options::MP_ORIGIN;
use crate::pace::{pause, PauseRange};
use crate::{ArticleSource, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum MpApiError {
    #[error("request failed: {0}")]
    Http(#[from] FetchError),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned ret={ret}: {message}")]
    Api { ret: i64, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub fakeid: String,
    pub nickname: String,
    pub alias: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleSummary {
    pub aid: String,
    pub title: String,
    pub link: String,
    /// Unix seconds.
    pub create_time: Option<i64>,
    pub digest: String,
    pub cover: String,
}

impl ArticleSummary {
    pub fn to_source(&self, account: Option<&str>) -> ArticleSource {
        ArticleSource {
            url: self.link.clone(),
            title: Some(self.title.clone()).filter(|t| !t.trim().is_empty()),
            publish_time: self.create_time.map(|t| t.to_string()),
            account: account.map(str::to_string),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BaseResp {
    ret: i64,
    err_msg: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    base_resp: BaseResp,
    #[serde(default)]
    list: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
struct AppMsgResponse {
    base_resp: BaseResp,
    #[serde(default)]
    app_msg_list: Vec<ArticleSummary>,
}

pub struct MpApi {
    client: Arc<dyn HttpClient>,
    token: String,
    base_url: String,
}

impl MpApi {
    /// `client` must carry the session cookie.
    pub fn new(client: Arc<dyn HttpClient>, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            base_url: MP_ORIGIN.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn search_accounts(
        &self,
        keyword: &str,
        begin: u32,
        count: u32,
    ) -> Result<Vec<AccountInfo>, MpApiError> {
        let begin = begin.to_string();
        let count = count.to_string();
        let url = self.endpoint(
            "cgi-bin/searchbiz",
            &[
                ("action", "search_biz"),
                ("begin", begin.as_str()),
                ("count", count.as_str()),
                ("query", keyword),
            ],
        )?;
        let response: SearchResponse = self.get_json(&url).await?;
        check(&response.base_resp)?;
        mp_debug!("search `{keyword}` returned {} accounts", response.list.len());
        Ok(response.list)
    }

    /// One page (1-based) of an account's published articles.
    pub async fn list_articles(
        &self,
        fakeid: &str,
        page: u32,
        count: u32,
    ) -> Result<Vec<ArticleSummary>, MpApiError> {
        let begin = (page.max(1) - 1).saturating_mul(count).to_string();
        let count = count.to_string();
        let url = self.endpoint(
            "cgi-bin/appmsg",
            &[
                ("action", "list_ex"),
                ("begin", begin.as_str()),
                ("count", count.as_str()),
                ("fakeid", fakeid),
                ("type", "9"),
            ],
        )?;
        let response: AppMsgResponse = self.get_json(&url).await?;
        check(&response.base_resp)?;
        Ok(response.app_msg_list)
    }

    /// Pages through the whole list until a short page, pausing between requests.
    /// A cancelled token ends the walk early with what was collected.
    pub async fn list_all_articles(
        &self,
        fakeid: &str,
        page_size: u32,
        pacing: PauseRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<ArticleSummary>, MpApiError> {
        let page_size = page_size.max(1);
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list_articles(fakeid, page, page_size).await?;
            let short = (batch.len() as u32) < page_size;
            all.extend(batch);
            mp_info!("listed page {page} of {fakeid}: {} articles so far", all.len());
            if short || !pause(pacing.sample(), cancel).await {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, MpApiError> {
        let common = [
            ("token", self.token.as_str()),
            ("lang", "zh_CN"),
            ("f", "json"),
            ("ajax", "1"),
        ];
        let url = Url::parse_with_params(
            &format!("{}/{path}", self.base_url),
            params.iter().chain(common.iter()),
        )?;
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, MpApiError> {
        let body = self.client.fetch_json(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn check(base: &BaseResp) -> Result<(), MpApiError> {
    if base.ret == 0 {
        Ok(())
    } else {
        Err(MpApiError::Api {
            ret: base.ret,
            message: base.err_msg.clone(),
        })
    }
}
