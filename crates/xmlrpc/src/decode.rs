//! XML-RPC document decoding.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::error::{Error, Result};
use crate::message::{Fault, MethodCall, MethodResponse};
use crate::value::{Value, decode_base64, parse_datetime};

/// Decode a `<methodResponse>` document.
///
/// An empty `<params/>` block decodes as [`Value::Nil`].
pub fn parse_response(xml: &str) -> Result<MethodResponse> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodResponse")?;

    let response = match parser.next_significant()? {
        Event::Start(e) if local_name(&e) == "params" => {
            let value = match parser.next_significant()? {
                Event::Start(e) if local_name(&e) == "param" => {
                    parser.expect_start("value")?;
                    let value = parser.value()?;
                    parser.expect_end("param")?;
                    parser.expect_end("params")?;
                    value
                }
                Event::End(_) => Value::Nil,
                Event::Start(e) => return Err(unexpected(&e, "<param>")),
                _ => return Err(Error::UnexpectedContent("<param>".into())),
            };
            MethodResponse::Success(value)
        }
        Event::Start(e) if local_name(&e) == "fault" => {
            parser.expect_start("value")?;
            let value = parser.value()?;
            parser.expect_end("fault")?;
            MethodResponse::Fault(fault_from_value(value)?)
        }
        Event::Start(e) => return Err(unexpected(&e, "<params> or <fault>")),
        _ => return Err(Error::UnexpectedContent("<params> or <fault>".into())),
    };

    parser.expect_end("methodResponse")?;
    Ok(response)
}

/// Decode a `<methodCall>` document.
pub fn parse_call(xml: &str) -> Result<MethodCall> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodCall")?;
    parser.expect_start("methodName")?;
    let method_name = parser.text()?.trim().to_string();

    let mut params = Vec::new();
    match parser.next_significant()? {
        Event::Start(e) if local_name(&e) == "params" => {
            loop {
                match parser.next_significant()? {
                    Event::Start(e) if local_name(&e) == "param" => {
                        parser.expect_start("value")?;
                        params.push(parser.value()?);
                        parser.expect_end("param")?;
                    }
                    Event::End(_) => break,
                    Event::Start(e) => return Err(unexpected(&e, "<param>")),
                    _ => return Err(Error::UnexpectedContent("<param>".into())),
                }
            }
            parser.expect_end("methodCall")?;
        }
        // </methodCall> directly after the name: no parameters.
        Event::End(_) => {}
        Event::Start(e) => return Err(unexpected(&e, "<params>")),
        _ => return Err(Error::UnexpectedContent("<params>".into())),
    }

    Ok(MethodCall {
        method_name,
        params,
    })
}

fn fault_from_value(value: Value) -> Result<Fault> {
    let Value::Struct(mut members) = value else {
        return Err(Error::InvalidFault("fault value is not a struct".into()));
    };

    let code = match members.remove("faultCode") {
        Some(Value::Int(n)) => n,
        Some(Value::I8(n)) => i32::try_from(n)
            .map_err(|_| Error::InvalidFault(format!("faultCode {n} out of range")))?,
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidFault(format!("faultCode {s:?} is not an integer")))?,
        Some(other) => {
            return Err(Error::InvalidFault(format!("faultCode has type {other:?}")));
        }
        None => return Err(Error::InvalidFault("missing faultCode".into())),
    };

    let message = match members.remove("faultString") {
        Some(Value::String(s)) => s,
        Some(other) => other.to_json().to_string(),
        None => return Err(Error::InvalidFault("missing faultString".into())),
    };

    Ok(Fault { code, message })
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        // `<nil/>` and `<params/>` arrive as a start/end pair.
        reader.config_mut().expand_empty_elements = true;
        Self { reader }
    }

    /// Next structural event, skipping the prolog, comments and
    /// whitespace between elements.
    fn next_significant(&mut self) -> Result<Event<'a>> {
        loop {
            match self.reader.read_event()? {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(t) if is_blank(&t) => {}
                Event::Eof => return Err(Error::UnexpectedEof),
                event => return Ok(event),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<()> {
        match self.next_significant()? {
            Event::Start(e) if local_name(&e) == name => Ok(()),
            Event::Start(e) => Err(unexpected(&e, &format!("<{name}>"))),
            _ => Err(Error::UnexpectedContent(format!("<{name}>"))),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next_significant()? {
            Event::End(e) if e.local_name().as_ref() == name.as_bytes() => Ok(()),
            Event::Start(e) => Err(unexpected(&e, &format!("</{name}>"))),
            _ => Err(Error::UnexpectedContent(format!("</{name}>"))),
        }
    }

    /// Character data up to the end of the current element.
    fn text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(std::str::from_utf8(&c)?),
                Event::Comment(_) | Event::PI(_) => {}
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(Error::UnexpectedEof),
                Event::Start(e) => return Err(unexpected(&e, "text")),
                _ => return Err(Error::UnexpectedContent("text".into())),
            }
        }
    }

    /// Contents of a `<value>` whose start tag was already consumed,
    /// including its end tag.
    fn value(&mut self) -> Result<Value> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(std::str::from_utf8(&c)?),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Start(e) => {
                    let value = self.typed(&e)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                // Untyped content defaults to string.
                Event::End(_) => return Ok(Value::String(text)),
                Event::Eof => return Err(Error::UnexpectedEof),
                _ => return Err(Error::UnexpectedContent("a value".into())),
            }
        }
    }

    fn typed(&mut self, start: &BytesStart<'_>) -> Result<Value> {
        let name = local_name(start);
        match name.as_str() {
            "int" | "i4" => {
                let text = self.text()?;
                parse_scalar(&text, "int").map(Value::Int)
            }
            "i8" => {
                let text = self.text()?;
                parse_scalar(&text, "i8").map(Value::I8)
            }
            "double" => {
                let text = self.text()?;
                parse_scalar(&text, "double").map(Value::Double)
            }
            "boolean" => {
                let text = self.text()?;
                match text.trim() {
                    "1" | "true" => Ok(Value::Boolean(true)),
                    "0" | "false" => Ok(Value::Boolean(false)),
                    _ => Err(Error::InvalidScalar {
                        kind: "boolean",
                        text,
                    }),
                }
            }
            "string" => self.text().map(Value::String),
            "dateTime.iso8601" => {
                let text = self.text()?;
                parse_datetime(text.trim())
                    .map(Value::DateTime)
                    .ok_or(Error::InvalidScalar {
                        kind: "dateTime.iso8601",
                        text,
                    })
            }
            "base64" => {
                let text = self.text()?;
                decode_base64(&text)
                    .map(Value::Base64)
                    .ok_or(Error::InvalidScalar {
                        kind: "base64",
                        text,
                    })
            }
            "nil" => {
                self.expect_end("nil")?;
                Ok(Value::Nil)
            }
            "array" => self.array(),
            "struct" => self.structure(),
            _ => Err(Error::UnexpectedElement {
                found: name,
                expected: "a value type".into(),
            }),
        }
    }

    fn array(&mut self) -> Result<Value> {
        self.expect_start("data")?;
        let mut items = Vec::new();
        loop {
            match self.next_significant()? {
                Event::Start(e) if local_name(&e) == "value" => items.push(self.value()?),
                Event::End(_) => break,
                Event::Start(e) => return Err(unexpected(&e, "<value>")),
                _ => return Err(Error::UnexpectedContent("<value>".into())),
            }
        }
        self.expect_end("array")?;
        Ok(Value::Array(items))
    }

    fn structure(&mut self) -> Result<Value> {
        let mut members = BTreeMap::new();
        loop {
            match self.next_significant()? {
                Event::Start(e) if local_name(&e) == "member" => {
                    self.expect_start("name")?;
                    let name = self.text()?;
                    self.expect_start("value")?;
                    let value = self.value()?;
                    self.expect_end("member")?;
                    members.insert(name, value);
                }
                Event::End(_) => break,
                Event::Start(e) => return Err(unexpected(&e, "<member>")),
                _ => return Err(Error::UnexpectedContent("<member>".into())),
            }
        }
        Ok(Value::Struct(members))
    }
}

fn parse_scalar<T: std::str::FromStr>(text: &str, kind: &'static str) -> Result<T> {
    text.trim().parse().map_err(|_| Error::InvalidScalar {
        kind,
        text: text.to_string(),
    })
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn unexpected(start: &BytesStart<'_>, expected: &str) -> Error {
    Error::UnexpectedElement {
        found: local_name(start),
        expected: expected.to_string(),
    }
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(xml: &str) -> Value {
        match parse_response(xml).unwrap() {
            MethodResponse::Success(value) => value,
            MethodResponse::Fault(fault) => panic!("unexpected fault: {fault}"),
        }
    }

    #[test]
    fn decode_int_response() {
        let xml = r#"<?xml version="1.0"?>
            <methodResponse>
              <params>
                <param><value><int>42</int></value></param>
              </params>
            </methodResponse>"#;
        assert_eq!(success(xml), Value::Int(42));
    }

    #[test]
    fn decode_untyped_value_as_string() {
        let xml = "<methodResponse><params><param><value> Finance &amp; Admin </value></param></params></methodResponse>";
        assert_eq!(success(xml), Value::String(" Finance & Admin ".into()));
    }

    #[test]
    fn decode_array_with_nil() {
        let xml = "<methodResponse><params><param><value><array><data>\
                   <value><double>12.5</double></value>\
                   <value><nil/></value>\
                   <value><ex:nil/></value>\
                   </data></array></value></param></params></methodResponse>";
        assert_eq!(
            success(xml),
            Value::Array(vec![Value::Double(12.5), Value::Nil, Value::Nil])
        );
    }

    #[test]
    fn decode_struct() {
        let xml = "<methodResponse><params><param><value><struct>\
                   <member><name>printer</name><value><string>laser-1</string></value></member>\
                   <member><name>enabled</name><value><boolean>1</boolean></value></member>\
                   </struct></value></param></params></methodResponse>";
        let value = success(xml);
        let members = value.as_struct().unwrap();
        assert_eq!(members["printer"], Value::from("laser-1"));
        assert_eq!(members["enabled"], Value::Boolean(true));
    }

    #[test]
    fn decode_empty_array_and_string() {
        let xml = "<methodResponse><params><param><value><array><data/></array></value></param></params></methodResponse>";
        assert_eq!(success(xml), Value::Array(vec![]));

        let xml = "<methodResponse><params><param><value><string/></value></param></params></methodResponse>";
        assert_eq!(success(xml), Value::String(String::new()));
    }

    #[test]
    fn decode_empty_params_as_nil() {
        let xml = "<methodResponse><params/></methodResponse>";
        assert_eq!(success(xml), Value::Nil);
    }

    #[test]
    fn decode_fault() {
        let xml = "<methodResponse><fault><value><struct>\
                   <member><name>faultCode</name><value><int>1</int></value></member>\
                   <member><name>faultString</name><value><string>Invalid authentication token</string></value></member>\
                   </struct></value></fault></methodResponse>";
        let response = parse_response(xml).unwrap();
        assert_eq!(
            response,
            MethodResponse::Fault(Fault {
                code: 1,
                message: "Invalid authentication token".into(),
            })
        );
    }

    #[test]
    fn fault_without_code_is_rejected() {
        let xml = "<methodResponse><fault><value><struct>\
                   <member><name>faultString</name><value>oops</value></member>\
                   </struct></value></fault></methodResponse>";
        assert!(matches!(parse_response(xml), Err(Error::InvalidFault(_))));
    }

    #[test]
    fn invalid_scalar_is_rejected() {
        let xml = "<methodResponse><params><param><value><int>many</int></value></param></params></methodResponse>";
        assert!(matches!(
            parse_response(xml),
            Err(Error::InvalidScalar { kind: "int", .. })
        ));
    }

    #[test]
    fn html_error_page_is_rejected() {
        let html = "<html><body>Not Found</body></html>";
        assert!(matches!(
            parse_response(html),
            Err(Error::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn truncated_document_is_rejected() {
        assert!(parse_response("<methodResponse><params><param>").is_err());
        assert!(parse_response("").is_err());
    }

    #[test]
    fn call_survives_encoding() {
        let call = MethodCall::new("api.getGroupMembers")
            .with_param("token")
            .with_param("Staff & Faculty")
            .with_param(0i32)
            .with_param(100i32);
        let decoded = parse_call(&call.to_xml()).unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn response_survives_encoding() {
        let response = MethodResponse::Success(Value::from(vec!["alice", "bob"]));
        assert_eq!(parse_response(&response.to_xml()).unwrap(), response);
    }

    #[test]
    fn call_without_params() {
        let call = parse_call("<methodCall><methodName>api.getTotalUsers</methodName></methodCall>")
            .unwrap();
        assert_eq!(call.method_name, "api.getTotalUsers");
        assert!(call.params.is_empty());
    }
}
