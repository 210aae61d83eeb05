pub mod http;
pub mod postgres;

pub use http::HttpGateway;
pub use postgres::PostgresGateway;
