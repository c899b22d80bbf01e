//! Resource-limit presets per Apple Silicon variant
//!
//! Static lookup table mapping a chip variant to the container memory/CPU
//! limits and environment toggles its compose files consume. Unknown
//! variants get the conservative preset.

use crate::system::apple::AppleVariant;
use serde::Serialize;

/// Performance profile tier a preset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceProfile {
    /// Maximum throughput, high-VRAM flags on
    Ultra,
    /// Aggressive limits for Max-class chips
    High,
    /// Tuned defaults for current-generation base chips
    Optimized,
    /// Middle-of-the-road limits
    Balanced,
    /// Safe limits for small or unknown hardware
    Conservative,
}

impl PerformanceProfile {
    /// Lowercase label exported to containers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultra => "ultra",
            Self::High => "high",
            Self::Optimized => "optimized",
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
        }
    }
}

/// Resource-limit preset for one chip variant
#[derive(Debug, Serialize)]
pub struct VariantProfile {
    /// Container memory limit (compose `mem_limit` syntax, e.g. "24G")
    pub memory_limit: &'static str,
    /// Fraction of host CPUs the container may use, as a string ("0.80")
    pub cpu_limit: &'static str,
    /// Profile tier
    pub performance_profile: PerformanceProfile,
    /// torch.compile mode hint for PyTorch-based images
    pub torch_compile_mode: &'static str,
    /// Extra environment passed to the compose invocation
    pub environment: &'static [(&'static str, &'static str)],
}

impl VariantProfile {
    /// Flatten the preset into compose environment variables. The limits
    /// themselves are exported so one compose file per platform can
    /// interpolate them instead of hardcoding per-variant YAML.
    pub fn compose_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("MEMORY_LIMIT".to_string(), self.memory_limit.to_string()),
            ("CPU_LIMIT".to_string(), self.cpu_limit.to_string()),
            (
                "PERFORMANCE_PROFILE".to_string(),
                self.performance_profile.as_str().to_string(),
            ),
            (
                "TORCH_COMPILE_MODE".to_string(),
                self.torch_compile_mode.to_string(),
            ),
        ];
        env.extend(
            self.environment
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        env
    }
}

static M4_MAX: VariantProfile = VariantProfile {
    memory_limit: "32G",
    cpu_limit: "0.85",
    performance_profile: PerformanceProfile::Ultra,
    torch_compile_mode: "max-autotune",
    environment: &[
        ("PYTORCH_MPS_PREFER_METAL", "1"),
        ("PYTORCH_MPS_ALLOCATOR_POLICY", "garbage_collection"),
        ("COMFYUI_M4_OPTIMIZATIONS", "1"),
        ("COMFYUI_ADVANCED_SAMPLING", "1"),
        ("COMFYUI_FAST_DECODE", "1"),
        ("COMFYUI_HIGHVRAM", "1"),
        ("COMFYUI_NORMALVRAM", "1"),
        ("COMFYUI_LOWVRAM", "0"),
    ],
};

static M4_PRO: VariantProfile = VariantProfile {
    memory_limit: "24G",
    cpu_limit: "0.80",
    performance_profile: PerformanceProfile::High,
    torch_compile_mode: "default",
    environment: &[
        ("PYTORCH_MPS_PREFER_METAL", "1"),
        ("PYTORCH_MPS_ALLOCATOR_POLICY", "garbage_collection"),
        ("COMFYUI_M4_OPTIMIZATIONS", "1"),
        ("COMFYUI_ADVANCED_SAMPLING", "1"),
        ("COMFYUI_FAST_DECODE", "1"),
        ("COMFYUI_HIGHVRAM", "0"),
        ("COMFYUI_NORMALVRAM", "1"),
        ("COMFYUI_LOWVRAM", "0"),
    ],
};

static M4_BASE: VariantProfile = VariantProfile {
    memory_limit: "16G",
    cpu_limit: "0.75",
    performance_profile: PerformanceProfile::Optimized,
    torch_compile_mode: "default",
    environment: &[
        ("PYTORCH_MPS_PREFER_METAL", "1"),
        ("PYTORCH_MPS_ALLOCATOR_POLICY", "garbage_collection"),
        ("COMFYUI_M4_OPTIMIZATIONS", "1"),
        ("COMFYUI_ADVANCED_SAMPLING", "1"),
        ("COMFYUI_FAST_DECODE", "1"),
        ("COMFYUI_HIGHVRAM", "0"),
        ("COMFYUI_NORMALVRAM", "1"),
        ("COMFYUI_LOWVRAM", "0"),
    ],
};

const NORMAL_VRAM_ENV: &[(&str, &str)] = &[
    ("COMFYUI_HIGHVRAM", "0"),
    ("COMFYUI_NORMALVRAM", "1"),
    ("COMFYUI_LOWVRAM", "0"),
];

const HIGH_VRAM_ENV: &[(&str, &str)] = &[
    ("COMFYUI_HIGHVRAM", "1"),
    ("COMFYUI_NORMALVRAM", "1"),
    ("COMFYUI_LOWVRAM", "0"),
];

const LOW_VRAM_ENV: &[(&str, &str)] = &[
    ("COMFYUI_HIGHVRAM", "0"),
    ("COMFYUI_NORMALVRAM", "0"),
    ("COMFYUI_LOWVRAM", "1"),
];

static M3_MAX: VariantProfile = VariantProfile {
    memory_limit: "24G",
    cpu_limit: "0.80",
    performance_profile: PerformanceProfile::High,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M3_PRO: VariantProfile = VariantProfile {
    memory_limit: "18G",
    cpu_limit: "0.75",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M3_BASE: VariantProfile = VariantProfile {
    memory_limit: "12G",
    cpu_limit: "0.70",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: LOW_VRAM_ENV,
};

static M2_ULTRA: VariantProfile = VariantProfile {
    memory_limit: "32G",
    cpu_limit: "0.85",
    performance_profile: PerformanceProfile::Ultra,
    torch_compile_mode: "default",
    environment: HIGH_VRAM_ENV,
};

static M2_MAX: VariantProfile = VariantProfile {
    memory_limit: "24G",
    cpu_limit: "0.80",
    performance_profile: PerformanceProfile::High,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M2_PRO: VariantProfile = VariantProfile {
    memory_limit: "16G",
    cpu_limit: "0.75",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M2_BASE: VariantProfile = VariantProfile {
    memory_limit: "12G",
    cpu_limit: "0.70",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: LOW_VRAM_ENV,
};

static M1_ULTRA: VariantProfile = VariantProfile {
    memory_limit: "24G",
    cpu_limit: "0.80",
    performance_profile: PerformanceProfile::High,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M1_MAX: VariantProfile = VariantProfile {
    memory_limit: "18G",
    cpu_limit: "0.75",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: NORMAL_VRAM_ENV,
};

static M1_PRO: VariantProfile = VariantProfile {
    memory_limit: "12G",
    cpu_limit: "0.70",
    performance_profile: PerformanceProfile::Balanced,
    torch_compile_mode: "default",
    environment: LOW_VRAM_ENV,
};

static M1_BASE: VariantProfile = VariantProfile {
    memory_limit: "8G",
    cpu_limit: "0.65",
    performance_profile: PerformanceProfile::Conservative,
    torch_compile_mode: "default",
    environment: LOW_VRAM_ENV,
};

static DEFAULT: VariantProfile = VariantProfile {
    memory_limit: "8G",
    cpu_limit: "0.60",
    performance_profile: PerformanceProfile::Conservative,
    torch_compile_mode: "default",
    environment: LOW_VRAM_ENV,
};

/// Look up the preset for a variant
pub fn profile_for(variant: AppleVariant) -> &'static VariantProfile {
    match variant {
        AppleVariant::M4Max => &M4_MAX,
        AppleVariant::M4Pro => &M4_PRO,
        AppleVariant::M4Base => &M4_BASE,
        AppleVariant::M3Max => &M3_MAX,
        AppleVariant::M3Pro => &M3_PRO,
        AppleVariant::M3Base => &M3_BASE,
        AppleVariant::M2Ultra => &M2_ULTRA,
        AppleVariant::M2Max => &M2_MAX,
        AppleVariant::M2Pro => &M2_PRO,
        AppleVariant::M2Base => &M2_BASE,
        AppleVariant::M1Ultra => &M1_ULTRA,
        AppleVariant::M1Max => &M1_MAX,
        AppleVariant::M1Pro => &M1_PRO,
        AppleVariant::M1Base => &M1_BASE,
        AppleVariant::Unknown => &DEFAULT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_variant_limits() {
        let p = profile_for(AppleVariant::M4Max);
        assert_eq!(p.memory_limit, "32G");
        assert_eq!(p.cpu_limit, "0.85");
        assert_eq!(p.performance_profile, PerformanceProfile::Ultra);
        assert_eq!(p.torch_compile_mode, "max-autotune");

        let p = profile_for(AppleVariant::M1Base);
        assert_eq!(p.memory_limit, "8G");
        assert_eq!(p.performance_profile, PerformanceProfile::Conservative);
    }

    #[test]
    fn test_unknown_gets_conservative_default() {
        let p = profile_for(AppleVariant::Unknown);
        assert_eq!(p.memory_limit, "8G");
        assert_eq!(p.cpu_limit, "0.60");
        assert!(p
            .environment
            .iter()
            .any(|&(k, v)| k == "COMFYUI_LOWVRAM" && v == "1"));
    }

    #[test]
    fn test_compose_env_contains_limits() {
        let env = profile_for(AppleVariant::M2Pro).compose_env();
        assert!(env.contains(&("MEMORY_LIMIT".to_string(), "16G".to_string())));
        assert!(env.contains(&("CPU_LIMIT".to_string(), "0.75".to_string())));
        assert!(env.contains(&("PERFORMANCE_PROFILE".to_string(), "balanced".to_string())));
        assert!(env.contains(&("COMFYUI_NORMALVRAM".to_string(), "1".to_string())));
    }

    #[test]
    fn test_every_variant_has_vram_toggles() {
        for variant in [
            AppleVariant::M1Base,
            AppleVariant::M2Ultra,
            AppleVariant::M3Pro,
            AppleVariant::M4Base,
            AppleVariant::Unknown,
        ] {
            let env = profile_for(variant).compose_env();
            for key in ["COMFYUI_HIGHVRAM", "COMFYUI_NORMALVRAM", "COMFYUI_LOWVRAM"] {
                assert!(
                    env.iter().any(|(k, _)| k == key),
                    "{variant:?} missing {key}"
                );
            }
        }
    }
}
