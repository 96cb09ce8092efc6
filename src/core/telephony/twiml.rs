//! TwiML documents returned by the call-setup webhook.

use url::Url;

use super::messages::CALL_SID_PARAMETER;

/// Path of the media stream WebSocket endpoint.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

/// Spoken to the caller while the translation leg comes up.
pub const CONNECTING_GREETING: &str = "Connecting to translation service";

/// Build the public `ws(s)://…/media-stream` URL Twilio should dial back.
///
/// With a configured public base URL the scheme is mapped `http → ws` and
/// `https → wss` and any path on the base is replaced. Without one the request
/// `Host` header is used with `wss`.
pub fn media_stream_url(public_base_url: Option<&str>, host: &str) -> Result<String, String> {
    let mut url = match public_base_url {
        Some(base) => {
            let mut url = Url::parse(base).map_err(|e| format!("Invalid public base URL: {e}"))?;
            let scheme = match url.scheme() {
                "http" | "ws" => "ws",
                "https" | "wss" => "wss",
                other => return Err(format!("Unsupported public base URL scheme: {other}")),
            };
            url.set_scheme(scheme)
                .map_err(|_| format!("Cannot use scheme {scheme} for {base}"))?;
            url
        }
        None => {
            if host.is_empty() {
                return Err("Missing Host header".to_string());
            }
            Url::parse(&format!("wss://{host}")).map_err(|e| format!("Invalid Host header: {e}"))?
        }
    };
    url.set_path(MEDIA_STREAM_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.into())
}

/// `<Say>` the greeting, then `<Connect><Stream>` to `stream_url`, passing the
/// call identifier as a custom parameter.
pub fn connect_stream_response(stream_url: &str, call_sid: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Say>{greeting}</Say>
  <Connect>
    <Stream url="{url}">
      <Parameter name="{param}" value="{call_sid}" />
    </Stream>
  </Connect>
</Response>"#,
        greeting = xml_escape(CONNECTING_GREETING),
        url = xml_escape(stream_url),
        param = CALL_SID_PARAMETER,
        call_sid = xml_escape(call_sid),
    )
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
