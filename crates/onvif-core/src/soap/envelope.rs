//! SOAP 1.2 request envelope construction.
//!
//! Layout of a built request:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" {caller namespaces}>
//!   <s:Header><Security ...>...</Security></s:Header>   (only with a username)
//!   <s:Body>{caller body}</s:Body>
//! </s:Envelope>
//! ```
//!
//! Caller namespaces are inserted verbatim as attribute declarations, e.g.
//! `xmlns:tds="http://www.onvif.org/ver10/device/wsdl"`.  The builder does not
//! validate them.

use std::sync::Arc;

use chrono::Duration;

use crate::security::{Clock, Entropy, OsEntropy, SecurityToken, SystemClock, TokenGenerationError};

/// SOAP 1.2 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Prefix the builder binds to [`SOAP_ENV_NS`].
pub const SOAP_ENV_PREFIX: &str = "s";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const PI_OPEN: &str = "<?";
const PI_CLOSE: &str = "?>";

/// One operation invocation, supplied by the service binding that uses the
/// transport.  Never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    /// Body fragment placed inside `<s:Body>`.
    pub body: String,
    /// Namespace declarations such as `xmlns:trt="..."`, in order.
    pub namespaces: Vec<String>,
    /// Empty means an unauthenticated request.
    pub username: String,
    pub secret: String,
    /// Added to the local clock for the token's `Created` time, to tolerate
    /// clock skew with the device.  May be negative.
    pub token_offset: Duration,
}

impl Default for SoapRequest {
    fn default() -> Self {
        Self {
            body: String::new(),
            namespaces: Vec::new(),
            username: String::new(),
            secret: String::new(),
            token_offset: Duration::zero(),
        }
    }
}

impl SoapRequest {
    /// Unauthenticated request with the given body and namespaces.
    pub fn new<I, S>(body: impl Into<String>, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            body: body.into(),
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Adds credentials; the token will be dated `now + token_offset`.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        secret: impl Into<String>,
        token_offset: Duration,
    ) -> Self {
        self.username = username.into();
        self.secret = secret.into();
        self.token_offset = token_offset;
        self
    }
}

/// Builds request documents.  Holds the randomness and clock used for tokens.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    entropy: Arc<dyn Entropy>,
    clock: Arc<dyn Clock>,
    ws_security: bool,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeBuilder {
    /// Builder using the OS random source and the system clock.
    pub fn new() -> Self {
        Self::with_sources(Arc::new(OsEntropy), Arc::new(SystemClock))
    }

    pub fn with_sources(entropy: Arc<dyn Entropy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entropy,
            clock,
            ws_security: true,
        }
    }

    /// Enables or disables the WS-Security header for authenticated requests.
    pub fn with_ws_security(mut self, enabled: bool) -> Self {
        self.ws_security = enabled;
        self
    }

    /// Builds one request document.
    ///
    /// A `Security` header is included exactly when `request.username` is
    /// non-empty and WS-Security is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`TokenGenerationError`] when a token is required but cannot be
    /// generated.  The request must not be sent in that case.
    pub fn build(&self, request: &SoapRequest) -> Result<String, TokenGenerationError> {
        let mut doc = String::with_capacity(512 + request.body.len());
        doc.push_str(XML_DECL);
        doc.push_str(&format!(
            r#"<{SOAP_ENV_PREFIX}:Envelope xmlns:{SOAP_ENV_PREFIX}="{SOAP_ENV_NS}""#
        ));
        for namespace in &request.namespaces {
            doc.push(' ');
            doc.push_str(namespace);
        }
        doc.push('>');

        if self.ws_security && !request.username.is_empty() {
            let token = SecurityToken::generate(
                &request.secret,
                request.token_offset,
                self.entropy.as_ref(),
                self.clock.as_ref(),
            )?;
            doc.push_str(&format!("<{SOAP_ENV_PREFIX}:Header>"));
            doc.push_str(&token.to_header(&request.username, SOAP_ENV_PREFIX));
            doc.push_str(&format!("</{SOAP_ENV_PREFIX}:Header>"));
        }

        doc.push_str(&format!("<{SOAP_ENV_PREFIX}:Body>"));
        doc.push_str(&request.body);
        doc.push_str(&format!(
            "</{SOAP_ENV_PREFIX}:Body></{SOAP_ENV_PREFIX}:Envelope>"
        ));

        Ok(collapse_whitespace(&doc))
    }
}

/// Removes whitespace-only text between elements and squeezes whitespace
/// runs inside tags to one space.
///
/// Text content, quoted attribute values, comments and CDATA sections are
/// left as is.  Processing instructions are squeezed but quotes inside them
/// are not tracked.
pub fn collapse_whitespace(doc: &str) -> String {
    let mut out = String::with_capacity(doc.len());
    let mut rest = doc;

    while !rest.is_empty() {
        if rest.starts_with(CDATA_OPEN) || rest.starts_with(COMMENT_OPEN) {
            let close = if rest.starts_with(CDATA_OPEN) {
                CDATA_CLOSE
            } else {
                COMMENT_CLOSE
            };
            let end = section_end(rest, close);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if rest.starts_with(PI_OPEN) {
            let end = section_end(rest, PI_CLOSE);
            push_squeezed(&mut out, &rest[..end]);
            rest = &rest[end..];
        } else if rest.starts_with('<') {
            let end = tag_end(rest);
            push_tag(&mut out, &rest[..end]);
            rest = &rest[end..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = &rest[..end];
            if !text.trim().is_empty() {
                out.push_str(text);
            }
            rest = &rest[end..];
        }
    }
    out
}

/// Byte index just past `close`, or the end of `s` if it never appears.
fn section_end(s: &str, close: &str) -> usize {
    s.find(close).map_or(s.len(), |i| i + close.len())
}

/// Squeezes whitespace runs to one space without quote tracking.
fn push_squeezed(out: &mut String, s: &str) {
    let mut pending_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
}

/// Byte index just past the `>` closing the tag at the start of `s`.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('>', None) => return i + 1,
            _ => {}
        }
    }
    s.len()
}

fn push_tag(out: &mut String, tag: &str) {
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for c in tag.chars() {
        if quote.is_none() && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            _ => {}
        }
        out.push(c);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
