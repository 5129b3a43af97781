use std::path::PathBuf;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request, Url};

use crate::{
    args::TesterArgs,
    error::{AppError, AppResult, HttpError, ValidationError},
};

/// Immutable description of the request every worker sends.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl RequestConfig {
    /// Validates the target and headers and builds the request description.
    ///
    /// Header names are case-insensitive; when a name repeats, the last value wins.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid, a header is invalid,
    /// or the body file cannot be read.
    pub fn new(
        url: &str,
        method: Method,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            url: parse_target_url(url)?,
            method,
            headers: build_header_map(headers)?,
            body,
        })
    }

    /// Builds the request description from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// See [`RequestConfig::new`].
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let url = args
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        Self::new(url, args.method.into(), &args.headers, resolve_body(args)?)
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub(crate) fn build_request(&self, client: &Client) -> Result<Request, reqwest::Error> {
        let mut request_builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = self.body.as_ref() {
            request_builder = request_builder.body(body.clone());
        }
        request_builder.build()
    }
}

fn parse_target_url(raw: &str) -> AppResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(ValidationError::EmptyUrl));
    }
    let url = Url::parse(trimmed).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: trimmed.to_owned(),
            source: err,
        })
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation(ValidationError::UnsupportedScheme {
            scheme: url.scheme().to_owned(),
        }));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::validation(ValidationError::UrlMissingHost {
            url: trimmed.to_owned(),
        }));
    }
    Ok(url)
}

fn build_header_map(headers: &[(String, String)]) -> AppResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            AppError::validation(ValidationError::InvalidHeaderName {
                header: key.clone(),
                source: err,
            })
        })?;
        let val = HeaderValue::from_str(value).map_err(|err| {
            AppError::validation(ValidationError::InvalidHeaderValue {
                header: key.clone(),
                source: err,
            })
        })?;
        map.insert(name, val);
    }
    Ok(map)
}

fn resolve_body(args: &TesterArgs) -> AppResult<Option<String>> {
    if let Some(path) = args.data_file.as_ref() {
        let content = std::fs::read_to_string(path).map_err(|err| {
            AppError::http(HttpError::ReadBodyFile {
                path: PathBuf::from(path),
                source: err,
            })
        })?;
        return Ok(Some(content));
    }
    Ok(args.data.clone())
}
