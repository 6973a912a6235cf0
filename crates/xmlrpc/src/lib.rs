//! XML-RPC value model and wire codec.
//!
//! Encodes `<methodCall>` requests and decodes `<methodResponse>` documents,
//! including faults. The transport is left to the caller.
//!
//! # Example
//!
//! ```
//! use xmlrpc::{MethodCall, MethodResponse, Value, parse_response};
//!
//! let body = MethodCall::new("api.getTotalUsers").with_param("token").to_xml();
//! assert!(body.contains("<methodName>api.getTotalUsers</methodName>"));
//!
//! let reply = "<methodResponse><params><param><value><int>42</int></value></param></params></methodResponse>";
//! assert_eq!(parse_response(reply)?, MethodResponse::Success(Value::Int(42)));
//! # Ok::<(), xmlrpc::Error>(())
//! ```

mod decode;
mod error;
mod message;
mod value;

pub use decode::{parse_call, parse_response};
pub use error::{Error, Result};
pub use message::{Fault, MethodCall, MethodResponse};
pub use value::{DATETIME_FORMAT, Value};
