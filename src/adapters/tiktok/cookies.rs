//! Browser cookie exports: Netscape `cookies.txt` or a JSON array

use std::path::Path;

use serde::Deserialize;

use crate::error::{UploadError, UploadResult};

/// Netscape lines marked http-only carry this prefix on the domain field
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonExport {
    List(Vec<Cookie>),
    Wrapped { cookies: Vec<Cookie> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn load(path: &Path) -> UploadResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse either export format, detected from the first non-blank character
    pub fn parse(content: &str) -> UploadResult<Self> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            let export: JsonExport = serde_json::from_str(trimmed)?;
            let cookies = match export {
                JsonExport::List(cookies) | JsonExport::Wrapped { cookies } => cookies,
            };
            return Ok(Self { cookies });
        }
        Ok(Self {
            cookies: trimmed.lines().filter_map(parse_netscape_line).collect(),
        })
    }

    /// Value of the last cookie with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// `Cookie` request header value
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Fail unless the jar holds a logged-in session
    pub fn require_session(&self) -> UploadResult<&str> {
        self.get("sessionid").filter(|v| !v.is_empty()).ok_or_else(|| {
            UploadError::Auth(
                "cookies file has no sessionid cookie; log in to TikTok in a browser and export the cookies again"
                    .to_string(),
            )
        })
    }
}

fn parse_netscape_line(line: &str) -> Option<Cookie> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
        Some(rest) => rest,
        None if line.starts_with('#') || line.trim().is_empty() => return None,
        None => line,
    };

    // domain, include-subdomains, path, secure, expiry, name, value
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 7 {
        return None;
    }
    Some(Cookie {
        domain: Some(fields[0].to_string()),
        name: fields[5].to_string(),
        value: fields[6].to_string(),
    })
}
