mod acquirer;
mod datasource;
mod exchange_rate;
mod price_quote;
mod sentiment;
mod venue_prices;

pub use acquirer::DataAcquirer;
pub use datasource::{render_fixed, AcquisitionResult, Payload};
#[cfg(test)]
pub use datasource::{FailureKind, FetchError, PriceQuote};
pub use exchange_rate::ExchangeRateDataSource;
pub use price_quote::{PriceQuoteDataSource, DEFAULT_API_KEY_HEADER};
pub use sentiment::SentimentDataSource;
pub use venue_prices::VenuePricesDataSource;
