use derive_more::From;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resampling algorithm, applied by the engine when a buffer size differs from the window size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResampleAlg {
    /// Nearest neighbour.
    #[default]
    Nearest,
    /// Bilinear.
    Bilinear,
    /// Cubic convolution.
    Cubic,
    /// Cubic B-spline.
    CubicSpline,
    /// Lanczos windowed sinc.
    Lanczos,
    /// Average of all contributing pixels.
    Average,
    /// Root mean square of all contributing pixels.
    Rms,
    /// Most frequent contributing value.
    Mode,
    /// Gaussian blurring.
    Gauss,
}

/// An unknown resampling algorithm error.
#[derive(Debug, Error, From)]
#[error("unknown resampling algorithm {_0}")]
pub struct UnknownResampleAlgError(String);

impl ResampleAlg {
    /// Returns the name of the resampling algorithm.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Nearest => "NEAREST",
            Self::Bilinear => "BILINEAR",
            Self::Cubic => "CUBIC",
            Self::CubicSpline => "CUBICSPLINE",
            Self::Lanczos => "LANCZOS",
            Self::Average => "AVERAGE",
            Self::Rms => "RMS",
            Self::Mode => "MODE",
            Self::Gauss => "GAUSS",
        }
    }
}

impl core::fmt::Display for ResampleAlg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for ResampleAlg {
    type Err = UnknownResampleAlgError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "NEAREST" | "NEARESTNEIGHBOUR" | "NEARESTNEIGHBOR" => Self::Nearest,
            "BILINEAR" => Self::Bilinear,
            "CUBIC" => Self::Cubic,
            "CUBICSPLINE" => Self::CubicSpline,
            "LANCZOS" => Self::Lanczos,
            "AVERAGE" => Self::Average,
            "RMS" => Self::Rms,
            "MODE" => Self::Mode,
            "GAUSS" => Self::Gauss,
            _ => return Err(name.to_string().into()),
        })
    }
}
