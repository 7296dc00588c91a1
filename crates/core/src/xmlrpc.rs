//! Minimal XML-RPC encoding shared by the ping notifier and the MetaWeblog
//! publisher.
//!
//! Only what those two calls need: building a `methodCall` document and
//! pulling faults, the first scalar return value and the `flerror` flag out
//! of a response.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// A parameter value in a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    fn write(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::String(s) => {
                out.push_str("<string>");
                out.push_str(&escape(s));
                out.push_str("</string>");
            }
            Value::Int(i) => {
                out.push_str(&format!("<int>{i}</int>"));
            }
            Value::Bool(b) => {
                out.push_str(if *b {
                    "<boolean>1</boolean>"
                } else {
                    "<boolean>0</boolean>"
                });
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name));
                    out.push_str("</name>");
                    value.write(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
        }
        out.push_str("</value>");
    }
}

/// Encode a `methodCall` document.
pub fn method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Escape text for use in XML character data and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape`] for the predefined entities.
pub fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

static FAULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<fault>.*?<name>\s*faultString\s*</name>\s*<value>\s*(?:<string>)?([^<]*)")
        .expect("valid fault regex")
});

static FIRST_PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<params>\s*<param>\s*<value>\s*(?:<(?:string|int|i4|i8)>)?([^<]*)")
        .expect("valid param regex")
});

/// The fault string if the response is a `<fault>`.
pub fn fault_string(body: &str) -> Option<String> {
    if !body.contains("<fault>") {
        return None;
    }
    Some(
        FAULT_RE
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| unescape(m.as_str().trim()))
            .unwrap_or_else(|| "unknown fault".to_string()),
    )
}

/// The first scalar return value, as text.
pub fn first_scalar(body: &str) -> Option<String> {
    FIRST_PARAM_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str().trim()))
        .filter(|s| !s.is_empty())
}

static FLERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<name>\s*flerror\s*</name>\s*<value>\s*<boolean>\s*([01])\s*</boolean>")
        .expect("valid flerror regex")
});

/// The `flerror` member of a ping response, if present.
pub fn flerror(body: &str) -> Option<bool> {
    FLERROR_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_call_encoding() {
        let xml = method_call(
            "weblogUpdates.ping",
            &[
                Value::string("Link Report: 2024-01-01-000000"),
                Value::string("https://example.com/?a=1&b=2"),
            ],
        );
        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?><methodCall><methodName>weblogUpdates.ping</methodName>\
             <params><param><value><string>Link Report: 2024-01-01-000000</string></value></param>\
             <param><value><string>https://example.com/?a=1&amp;b=2</string></value></param>\
             </params></methodCall>"
        );
    }

    #[test]
    fn test_struct_and_bool_encoding() {
        let xml = method_call(
            "metaWeblog.newPost",
            &[
                Value::Struct(vec![("title".to_string(), Value::string("<b>"))]),
                Value::Bool(true),
                Value::Int(3),
            ],
        );
        assert!(xml.contains(
            "<struct><member><name>title</name><value><string>&lt;b&gt;</string></value></member></struct>"
        ));
        assert!(xml.contains("<boolean>1</boolean>"));
        assert!(xml.contains("<int>3</int>"));
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = r#"a < b & "c" > 'd'"#;
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn test_fault_string() {
        let body = r#"<?xml version="1.0"?>
<methodResponse><fault><value><struct>
  <member><name>faultCode</name><value><int>403</int></value></member>
  <member><name>faultString</name><value><string>Incorrect username or password.</string></value></member>
</struct></value></fault></methodResponse>"#;
        assert_eq!(
            fault_string(body).as_deref(),
            Some("Incorrect username or password.")
        );
        assert_eq!(fault_string("<methodResponse><params/></methodResponse>"), None);
    }

    #[test]
    fn test_first_scalar() {
        let string_body = "<methodResponse><params><param><value><string>42</string></value></param></params></methodResponse>";
        assert_eq!(first_scalar(string_body).as_deref(), Some("42"));

        let bare_body = "<methodResponse><params><param><value>17</value></param></params></methodResponse>";
        assert_eq!(first_scalar(bare_body).as_deref(), Some("17"));

        let int_body = "<methodResponse><params>\n <param>\n  <value><i4>9</i4></value>\n </param>\n</params></methodResponse>";
        assert_eq!(first_scalar(int_body).as_deref(), Some("9"));
    }

    #[test]
    fn test_flerror() {
        let body = r#"<methodResponse><params><param><value><struct>
<member><name>flerror</name><value><boolean>0</boolean></value></member>
<member><name>message</name><value>Thanks for the ping.</value></member>
</struct></value></param></params></methodResponse>"#;
        assert_eq!(flerror(body), Some(false));
        assert_eq!(flerror(&body.replace("flerror", "other")), None);
        assert_eq!(
            flerror(&body.replace("<boolean>0", "<boolean>1")),
            Some(true)
        );
    }
}
