pub mod decision;
pub mod flow;
pub mod forecast;
pub mod interval;
pub mod prices;
pub mod retry;
pub mod series;
pub mod state;
