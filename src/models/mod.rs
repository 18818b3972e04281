//! Document model for parsed `.http` files and the response snapshots
//! captured while executing them.

pub mod document;
pub mod map;
pub mod request;
pub mod response;

pub use document::ParsedFile;
pub use map::OrderedMap;
pub use request::{HttpMethod, ParsedRequest};
pub use response::{HttpResponse, ResponseBody};
