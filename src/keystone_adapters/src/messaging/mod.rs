pub mod http_message_bus;
pub mod in_memory_message_bus;

pub use http_message_bus::HttpMessageBus;
pub use in_memory_message_bus::InMemoryMessageBus;
