pub mod brave;
pub mod coingecko;
pub mod price_provider;
pub mod search_provider;
