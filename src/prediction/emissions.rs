//! Indicative emission estimates for a blend
//!
//! Stoichiometric estimates from fixed carbon, sulphur and nitrogen, plus
//! particulate and volatile-organic indices from ash, VM and coke strength.
//! Inputs are the staged pipeline's weighted sums divided by 100.

use serde::Serialize;

use super::staged::WeightedSums;
use crate::types::columns;

const M_CO2: f64 = 44.01;
const M_CO: f64 = 28.01;
const M_C: f64 = 12.01;
const M_SO2: f64 = 64.07;
const M_S: f64 = 32.06;
const M_NO: f64 = 30.01;
const M_NO2: f64 = 46.01;
const M_N: f64 = 14.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EmissionEstimates {
    pub co2: f64,
    pub co: f64,
    pub so2: f64,
    pub no: f64,
    pub no2: f64,
    pub pm_index: f64,
    pub pm10: f64,
    pub pm25: f64,
    pub voc_index: f64,
    pub voc: f64,
    pub pah: f64,
}

impl EmissionEstimates {
    pub fn from_weighted(w: &WeightedSums) -> Self {
        let x = |column: &str| w.sum(column) / 100.0;
        let (ash, vm, fc) = (x(columns::ASH), x(columns::VM), x(columns::FC));
        let (s, n) = (x(columns::S), x(columns::N));
        let (cri, csr) = (x(columns::CRI), x(columns::CSR));

        let pm_index = 0.4 * (ash / 9.0) + 0.3 * (cri / 28.0) + 0.3 * (1.0 - csr / 65.0);
        let voc_index =
            0.5 * (vm / 2.5) + 0.2 * (cri / 28.0) + 0.2 * (1.0 - csr / 65.0) + 0.1 * (n / 1.0);

        Self {
            co2: 0.7 * (fc / 100.0) * (M_CO2 / M_C) * 10.0,
            co: 0.3 * (fc / 100.0) * (M_CO / M_C) * 10.0,
            so2: (s / 100.0) * (M_SO2 / M_S) * 10.0,
            no: 0.2 * (n / 100.0) * (M_NO / M_N) * 10.0,
            no2: 0.2 * (n / 100.0) * (M_NO2 / M_N) * 10.0,
            pm_index,
            pm10: 0.7 * pm_index,
            pm25: 0.3 * pm_index,
            voc_index,
            voc: 0.9 * voc_index,
            pah: 0.1 * voc_index,
        }
    }
}
