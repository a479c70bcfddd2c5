//! Product definitions: each names its own monitoring timeline and
//! exercise/payoff shape.
//!
//! Grounded on `original_source/Products.hpp`'s `Product<T>` hierarchy
//! (`European_Call`, `Up_and_Out_Call`, `Equity_AutoCallable`), redesigned
//! per the spec's tagged-`enum` direction — the teacher's own
//! `rustatlas/src/models/model.rs::Model<'a>` is the precedent for
//! replacing virtual dispatch with a match on a plain enum.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Product {
    EuropeanCall {
        maturity: f64,
        strike: f64,
    },
    /// Up-and-out call, monitored at `freq`-spaced dates up to maturity.
    UpAndOutCall {
        maturity: f64,
        strike: f64,
        upper: f64,
        freq: f64,
    },
    /// Equity auto-callable: at each observation date before the last,
    /// a coupon is paid if spot is below `upper`; at the last date the
    /// note either pays its final coupon (spot below `upper`) or returns
    /// principal adjusted by the drop below `lower` relative to
    /// `anchor`.
    AutoCallable {
        times: Vec<f64>,
        coupon: f64,
        upper: f64,
        lower: f64,
        anchor: f64,
    },
}

impl Product {
    /// Dates at which the product needs a computed running spot to
    /// decide something — mirrors each C++ subclass constructor's
    /// `timeline()`.
    pub fn timeline(&self) -> Vec<f64> {
        match self {
            Product::EuropeanCall { maturity, .. } => vec![*maturity],
            Product::UpAndOutCall { maturity, freq, .. } => {
                let mut t = Vec::new();
                let mut time = *freq;
                while time < *maturity {
                    t.push(time);
                    time += *freq;
                }
                if t.last() != Some(maturity) {
                    t.push(*maturity);
                }
                t
            }
            Product::AutoCallable { times, .. } => times.clone(),
        }
    }

    pub fn maturity(&self) -> f64 {
        match self {
            Product::EuropeanCall { maturity, .. } => *maturity,
            Product::UpAndOutCall { maturity, .. } => *maturity,
            Product::AutoCallable { times, .. } => {
                times.iter().cloned().fold(f64::MIN, f64::max)
            }
        }
    }
}
