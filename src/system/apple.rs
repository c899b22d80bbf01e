//! Apple Silicon variant detection
//!
//! Apple does not expose the chip variant directly; the brand string gives
//! the generation (M1..M4) and the performance/efficiency core counts give
//! the tier. Classification is a flat rule table evaluated top to bottom:
//! first rule whose generation matches and whose core minima are met wins.

use crate::error::{LauncherError, Result};
use crate::system::profiles::{profile_for, VariantProfile};
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::warn;

/// Apple Silicon chip variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum AppleVariant {
    M1Base,
    M1Pro,
    M1Max,
    M1Ultra,
    M2Base,
    M2Pro,
    M2Max,
    M2Ultra,
    M3Base,
    M3Pro,
    M3Max,
    M4Base,
    M4Pro,
    M4Max,
    /// Apple Silicon, but not a recognized variant
    Unknown,
}

impl AppleVariant {
    /// Label used in logs and reports (matches the preset table naming)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1Base => "M1_BASE",
            Self::M1Pro => "M1_PRO",
            Self::M1Max => "M1_MAX",
            Self::M1Ultra => "M1_ULTRA",
            Self::M2Base => "M2_BASE",
            Self::M2Pro => "M2_PRO",
            Self::M2Max => "M2_MAX",
            Self::M2Ultra => "M2_ULTRA",
            Self::M3Base => "M3_BASE",
            Self::M3Pro => "M3_PRO",
            Self::M3Max => "M3_MAX",
            Self::M4Base => "M4_BASE",
            Self::M4Pro => "M4_PRO",
            Self::M4Max => "M4_MAX",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Classify from the CPU brand string and physical core counts.
    ///
    /// `performance_cores` is `hw.perflevel0.physicalcpu`,
    /// `efficiency_cores` is `hw.perflevel1.physicalcpu`.
    pub fn classify(brand: &str, performance_cores: u32, efficiency_cores: u32) -> Self {
        let brand = brand.to_lowercase();
        for rule in VARIANT_RULES {
            if brand.contains(rule.generation)
                && performance_cores >= rule.min_performance_cores
                && efficiency_cores >= rule.min_efficiency_cores
            {
                return rule.variant;
            }
        }
        Self::Unknown
    }
}

impl std::fmt::Display for AppleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct VariantRule {
    generation: &'static str,
    min_performance_cores: u32,
    min_efficiency_cores: u32,
    variant: AppleVariant,
}

/// Ordered first-match-wins rule table. Within a generation the larger tier
/// must come first; newer generations come before older ones because the
/// brand string only ever names one generation.
const VARIANT_RULES: &[VariantRule] = &[
    // M4 (2024)
    VariantRule { generation: "m4", min_performance_cores: 14, min_efficiency_cores: 20, variant: AppleVariant::M4Max },
    VariantRule { generation: "m4", min_performance_cores: 12, min_efficiency_cores: 16, variant: AppleVariant::M4Pro },
    VariantRule { generation: "m4", min_performance_cores: 4, min_efficiency_cores: 6, variant: AppleVariant::M4Base },
    // M3 (2023)
    VariantRule { generation: "m3", min_performance_cores: 12, min_efficiency_cores: 16, variant: AppleVariant::M3Max },
    VariantRule { generation: "m3", min_performance_cores: 8, min_efficiency_cores: 4, variant: AppleVariant::M3Pro },
    VariantRule { generation: "m3", min_performance_cores: 4, min_efficiency_cores: 4, variant: AppleVariant::M3Base },
    // M2 (2022)
    VariantRule { generation: "m2", min_performance_cores: 8, min_efficiency_cores: 16, variant: AppleVariant::M2Ultra },
    VariantRule { generation: "m2", min_performance_cores: 8, min_efficiency_cores: 8, variant: AppleVariant::M2Max },
    VariantRule { generation: "m2", min_performance_cores: 6, min_efficiency_cores: 4, variant: AppleVariant::M2Pro },
    VariantRule { generation: "m2", min_performance_cores: 4, min_efficiency_cores: 4, variant: AppleVariant::M2Base },
    // M1 (2020-2021)
    VariantRule { generation: "m1", min_performance_cores: 8, min_efficiency_cores: 16, variant: AppleVariant::M1Ultra },
    VariantRule { generation: "m1", min_performance_cores: 8, min_efficiency_cores: 8, variant: AppleVariant::M1Max },
    VariantRule { generation: "m1", min_performance_cores: 6, min_efficiency_cores: 2, variant: AppleVariant::M1Pro },
    VariantRule { generation: "m1", min_performance_cores: 4, min_efficiency_cores: 4, variant: AppleVariant::M1Base },
];

/// Detected Apple Silicon chip with its resource preset
#[derive(Debug, Clone, Serialize)]
pub struct AppleSilicon {
    /// Chip variant label
    pub variant: AppleVariant,
    /// CPU brand string as reported by sysctl
    pub brand: String,
    /// Physical performance cores
    pub performance_cores: u32,
    /// Physical efficiency cores
    pub efficiency_cores: u32,
    /// Resource-limit preset for this variant
    #[serde(skip)]
    pub profile: &'static VariantProfile,
}

impl AppleSilicon {
    /// Detect the Apple Silicon variant of the current host. Returns None
    /// on non-Apple hosts; on an Apple host where the sysctl probes fail,
    /// returns the Unknown variant with the conservative preset.
    pub fn detect() -> Option<Self> {
        if !super::platform::is_apple_silicon_host() {
            return None;
        }

        let brand = match sysctl("machdep.cpu.brand_string") {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "could not read CPU brand string");
                return Some(Self::unknown(String::new()));
            }
        };
        let performance_cores = sysctl_u32("hw.perflevel0.physicalcpu").unwrap_or(0);
        let efficiency_cores = sysctl_u32("hw.perflevel1.physicalcpu").unwrap_or(0);

        let variant = AppleVariant::classify(&brand, performance_cores, efficiency_cores);
        Some(Self {
            variant,
            brand,
            performance_cores,
            efficiency_cores,
            profile: profile_for(variant),
        })
    }

    fn unknown(brand: String) -> Self {
        Self {
            variant: AppleVariant::Unknown,
            brand,
            performance_cores: 0,
            efficiency_cores: 0,
            profile: profile_for(AppleVariant::Unknown),
        }
    }
}

fn sysctl(name: &str) -> Result<String> {
    let output = Command::new("sysctl")
        .arg("-n")
        .arg(name)
        .output()
        .map_err(|e| LauncherError::detection(format!("sysctl {name}: {e}")))?;
    if !output.status.success() {
        return Err(LauncherError::detection(format!(
            "sysctl {name} exited with {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn sysctl_u32(name: &str) -> Option<u32> {
    sysctl(name).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_m4_tiers() {
        assert_eq!(AppleVariant::classify("Apple M4 Max", 14, 20), AppleVariant::M4Max);
        assert_eq!(AppleVariant::classify("Apple M4 Pro", 12, 16), AppleVariant::M4Pro);
        assert_eq!(AppleVariant::classify("Apple M4", 4, 6), AppleVariant::M4Base);
        // Core counts below the base minima stay unclassified
        assert_eq!(AppleVariant::classify("Apple M4", 2, 2), AppleVariant::Unknown);
    }

    #[test]
    fn test_first_match_wins() {
        // An M2 Ultra's core counts also satisfy the Max and Pro rules;
        // the Ultra rule is listed first and must win.
        assert_eq!(AppleVariant::classify("Apple M2 Ultra", 16, 16), AppleVariant::M2Ultra);
        assert_eq!(AppleVariant::classify("Apple M2 Max", 8, 8), AppleVariant::M2Max);
    }

    #[test]
    fn test_m1_and_m3() {
        assert_eq!(AppleVariant::classify("Apple M1 Pro", 6, 2), AppleVariant::M1Pro);
        assert_eq!(AppleVariant::classify("Apple M1", 4, 4), AppleVariant::M1Base);
        assert_eq!(AppleVariant::classify("Apple M3 Max", 12, 16), AppleVariant::M3Max);
        assert_eq!(AppleVariant::classify("Apple M3 Pro", 8, 4), AppleVariant::M3Pro);
    }

    #[test]
    fn test_unknown_generation() {
        assert_eq!(AppleVariant::classify("Apple M9", 32, 32), AppleVariant::Unknown);
        assert_eq!(AppleVariant::classify("Intel(R) Xeon(R)", 16, 16), AppleVariant::Unknown);
    }

    #[test]
    fn test_case_insensitive_brand() {
        assert_eq!(AppleVariant::classify("apple m4 pro", 12, 16), AppleVariant::M4Pro);
    }
}
