//! ESTRY channel type codes and structure lookup tables.

/// SWMM object a channel becomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelKind {
    Conduit(ConduitShape),
    Weir(&'static WeirSpec),
    Orifice,
    Outlet,
    Pump,
    /// Bridge modelled as a culvert with a custom shape curve.
    Bridge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConduitShape {
    Circular,
    Rectangular,
    Irregular,
}

impl ConduitShape {
    pub fn swmm_name(&self) -> &'static str {
        match self {
            ConduitShape::Circular => "CIRCULAR",
            ConduitShape::Rectangular => "RECT_CLOSED",
            ConduitShape::Irregular => "IRREGULAR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeirSpec {
    pub code: &'static str,
    pub swmm_type: &'static str,
    /// Discharge coefficient in SI units.
    pub coeff: f64,
    pub xsection: &'static str,
}

/// Weir codes and their SWMM equivalents.
pub const WEIR_TYPES: &[WeirSpec] = &[
    WeirSpec { code: "W", swmm_type: "TRANSVERSE", coeff: 1.70, xsection: "RECT_OPEN" },
    WeirSpec { code: "WB", swmm_type: "TRANSVERSE", coeff: 1.70, xsection: "RECT_OPEN" },
    WeirSpec { code: "WC", swmm_type: "TRANSVERSE", coeff: 1.84, xsection: "RECT_OPEN" },
    WeirSpec { code: "WO", swmm_type: "TRANSVERSE", coeff: 2.10, xsection: "RECT_OPEN" },
    WeirSpec { code: "WR", swmm_type: "TRANSVERSE", coeff: 1.84, xsection: "RECT_OPEN" },
    WeirSpec { code: "WT", swmm_type: "TRAPEZOIDAL", coeff: 1.84, xsection: "TRAPEZOIDAL" },
    WeirSpec { code: "WV", swmm_type: "V-NOTCH", coeff: 1.38, xsection: "TRIANGULAR" },
    WeirSpec { code: "WW", swmm_type: "TRANSVERSE", coeff: 1.70, xsection: "RECT_OPEN" },
];

/// Weir used for flow over the top of a culvert or bridge deck.
pub fn over_top_weir() -> &'static WeirSpec {
    &WEIR_TYPES[0]
}

pub fn weir_spec(code: &str) -> Option<&'static WeirSpec> {
    WEIR_TYPES.iter().find(|w| w.code.eq_ignore_ascii_case(code))
}

/// Default orifice discharge coefficient for sluice gates.
pub const SLUICE_GATE_COEFF: f64 = 0.65;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelType {
    pub code: String,
    pub kind: ChannelKind,
    pub unidirectional: bool,
    pub operational: bool,
    pub weir_over_top: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// No known base code prefixes the type.
    Unknown(String),
    /// A weir code that is not in [`WEIR_TYPES`].
    UnknownWeir(String),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::Unknown(code) => write!(f, "channel type '{}' is not supported", code),
            ClassifyError::UnknownWeir(code) => {
                write!(f, "weir type '{}' has no SWMM equivalent", code)
            }
        }
    }
}

/// Splits a type code into a base structure and trailing flags
/// (`U` unidirectional, `O` operational, `W` weir over the top).
pub fn classify(code: &str) -> Result<ChannelType, ClassifyError> {
    let upper = code.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(ClassifyError::Unknown(code.to_string()));
    }

    let (kind, flags) = if let Some(rest) = upper.strip_prefix("SG") {
        (ChannelKind::Orifice, rest)
    } else if let Some(rest) = upper.strip_prefix("BB") {
        (ChannelKind::Bridge, rest)
    } else if let Some(rest) = upper.strip_prefix('W') {
        // the weir letter is the first character after W, if any
        let (spec_code, flags) = match rest.chars().next() {
            Some(c) if !matches!(c, 'U' | 'O') => upper.split_at(2),
            _ => upper.split_at(1),
        };
        let spec = weir_spec(spec_code)
            .ok_or_else(|| ClassifyError::UnknownWeir(spec_code.to_string()))?;
        (ChannelKind::Weir(spec), flags)
    } else if let Some(rest) = upper.strip_prefix('C') {
        (ChannelKind::Conduit(ConduitShape::Circular), rest)
    } else if let Some(rest) = upper.strip_prefix('R') {
        (ChannelKind::Conduit(ConduitShape::Rectangular), rest)
    } else if let Some(rest) = upper.strip_prefix('I') {
        (ChannelKind::Conduit(ConduitShape::Irregular), rest)
    } else if let Some(rest) = upper.strip_prefix('Q') {
        (ChannelKind::Outlet, rest)
    } else if let Some(rest) = upper.strip_prefix('P') {
        (ChannelKind::Pump, rest)
    } else {
        return Err(ClassifyError::Unknown(code.to_string()));
    };

    let mut channel = ChannelType {
        code: upper.clone(),
        kind,
        unidirectional: false,
        operational: false,
        weir_over_top: false,
    };
    for flag in flags.chars() {
        match flag {
            'U' => channel.unidirectional = true,
            'O' => channel.operational = true,
            'W' if !matches!(kind, ChannelKind::Weir(_)) => channel.weir_over_top = true,
            _ => return Err(ClassifyError::Unknown(code.to_string())),
        }
    }
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conduit_flags() {
        let c = classify("cu").unwrap();
        assert_eq!(c.kind, ChannelKind::Conduit(ConduitShape::Circular));
        assert!(c.unidirectional);
        let r = classify("RW").unwrap();
        assert_eq!(r.kind, ChannelKind::Conduit(ConduitShape::Rectangular));
        assert!(r.weir_over_top);
    }

    #[test]
    fn weirs_use_the_lookup_table() {
        let w = classify("WV").unwrap();
        assert!(matches!(w.kind, ChannelKind::Weir(spec) if spec.swmm_type == "V-NOTCH"));
        let plain = classify("W").unwrap();
        assert!(matches!(plain.kind, ChannelKind::Weir(spec) if spec.code == "W"));
        let gated = classify("WBU").unwrap();
        assert!(gated.unidirectional);
        assert_eq!(classify("WX"), Err(ClassifyError::UnknownWeir("WX".into())));
    }

    #[test]
    fn structures_and_unknowns() {
        assert_eq!(classify("SG").unwrap().kind, ChannelKind::Orifice);
        assert!(classify("SGO").unwrap().operational);
        assert_eq!(classify("BBW").unwrap().kind, ChannelKind::Bridge);
        assert!(classify("BBW").unwrap().weir_over_top);
        assert_eq!(classify("Q").unwrap().kind, ChannelKind::Outlet);
        assert_eq!(classify("P").unwrap().kind, ChannelKind::Pump);
        assert!(matches!(classify("S"), Err(ClassifyError::Unknown(_))));
        assert!(matches!(classify(""), Err(ClassifyError::Unknown(_))));
    }
}
