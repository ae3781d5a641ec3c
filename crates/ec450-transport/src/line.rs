//! Serial line settings.
//!
//! The EC450 talks 19200 baud, 8 data bits, no parity, 1 stop bit. Opening and
//! configuring the port is the host's job; these settings exist so the host can
//! check what it configured against what the device emits.

use std::fmt;

use tracing::warn;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "none",
            Parity::Even => "even",
            Parity::Odd => "odd",
        };
        f.write_str(name)
    }
}

/// UART settings for an EC450 link.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LineConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl LineConfig {
    /// Settings the device transmits with.
    pub const EC450: LineConfig = LineConfig {
        baud_rate: 19_200,
        data_bits: 8,
        stop_bits: 1,
        parity: Parity::None,
    };

    /// Human-readable differences from [`LineConfig::EC450`].
    pub fn mismatches(&self) -> Vec<String> {
        let expected = Self::EC450;
        let mut out = Vec::new();
        if self.baud_rate != expected.baud_rate {
            out.push(format!(
                "baud rate {} (expected {})",
                self.baud_rate, expected.baud_rate
            ));
        }
        if self.data_bits != expected.data_bits {
            out.push(format!(
                "data bits {} (expected {})",
                self.data_bits, expected.data_bits
            ));
        }
        if self.stop_bits != expected.stop_bits {
            out.push(format!(
                "stop bits {} (expected {})",
                self.stop_bits, expected.stop_bits
            ));
        }
        if self.parity != expected.parity {
            out.push(format!(
                "parity {} (expected {})",
                self.parity, expected.parity
            ));
        }
        out
    }

    /// Log every mismatch at warn level. Returns true when the settings match.
    pub fn check(&self) -> bool {
        let mismatches = self.mismatches();
        for m in &mismatches {
            warn!(setting = %m, "serial line settings differ from device");
        }
        mismatches.is_empty()
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::EC450
    }
}

impl fmt::Display for LineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}
