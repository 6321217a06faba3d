pub mod builder;
pub mod handler;
pub mod router;

pub use builder::ServerBuilder;
pub use handler::RequestHandler;
pub use router::Router;
