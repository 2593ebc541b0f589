mod forecast;
mod indicator_frame;
mod price_series;
pub mod regressor;
mod scaler;
mod sequence;

pub use forecast::{ForecastMetrics, ForecastPoint, ForecastResult, HistoricalPoint};
pub use indicator_frame::{Column, IndicatorFrame};
pub use price_series::PriceSeries;
pub use regressor::{Regressor, SequenceRegressor};
pub use scaler::{MinMaxScaler, ScalerState};
pub use sequence::{SequenceSplitter, TrainTestSplit, Window};
