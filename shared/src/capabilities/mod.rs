pub mod http;
pub mod kv;

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

pub use self::http::{HttpError, HttpResult};
pub use self::kv::{KeyValueError, KeyValueOperation, KvResult};

use crate::event::Event;

/// Effects the shell executes on the core's behalf.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
}
