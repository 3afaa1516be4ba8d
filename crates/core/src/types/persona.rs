//! Persona mixes: the synthetic shopper panels fed into a simulation.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A synthetic shopper profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub name: &'static str,
    pub demographics: &'static str,
    pub device: Device,
    /// What the shopper is trying to achieve and what makes them leave.
    pub motivation: &'static str,
}

/// Device a persona shops on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
    Tablet,
}

/// Error returned when parsing an unknown persona mix name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown persona mix: {0}")]
pub struct UnknownPersonaMix(pub String);

/// A named set of five synthetic shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersonaMix {
    #[default]
    Balanced,
    Budget,
    Luxury,
    Mobile,
    International,
}

const BALANCED: [Persona; 5] = [
    Persona {
        name: "Maya",
        demographics: "28, urban professional, first-time visitor",
        device: Device::Mobile,
        motivation: "Wants a quick purchase on her commute; leaves on slow pages or forced sign-up",
    },
    Persona {
        name: "Robert",
        demographics: "54, suburban, cautious online shopper",
        device: Device::Desktop,
        motivation: "Needs trust signals and clear return policy before paying",
    },
    Persona {
        name: "Priya",
        demographics: "35, parent, deal-seeker",
        device: Device::Mobile,
        motivation: "Compares total cost including shipping; abandons on surprise fees",
    },
    Persona {
        name: "Jordan",
        demographics: "22, student, impulse buyer",
        device: Device::Mobile,
        motivation: "Buys fast with wallet payments; leaves if Apple Pay or Shop Pay is missing",
    },
    Persona {
        name: "Elena",
        demographics: "41, returning customer, brand loyal",
        device: Device::Desktop,
        motivation: "Expects saved details and fast re-order; frustrated by repeated form entry",
    },
];

const BUDGET: [Persona; 5] = [
    Persona {
        name: "Carlos",
        demographics: "31, price-sensitive, coupon hunter",
        device: Device::Mobile,
        motivation: "Searches for a discount code field; leaves to find codes elsewhere",
    },
    Persona {
        name: "Tasha",
        demographics: "26, part-time worker, tight budget",
        device: Device::Mobile,
        motivation: "Abandons when shipping pushes the total over her limit",
    },
    Persona {
        name: "Greg",
        demographics: "47, bargain comparer",
        device: Device::Desktop,
        motivation: "Opens competitor tabs; needs price-match or free-shipping threshold",
    },
    Persona {
        name: "Linh",
        demographics: "38, buys in bulk",
        device: Device::Desktop,
        motivation: "Looks for quantity discounts and clear per-unit pricing",
    },
    Persona {
        name: "Sam",
        demographics: "19, first job, BNPL user",
        device: Device::Mobile,
        motivation: "Needs pay-later options visible before checkout",
    },
];

const LUXURY: [Persona; 5] = [
    Persona {
        name: "Victoria",
        demographics: "45, executive, high income",
        device: Device::Desktop,
        motivation: "Expects premium presentation and white-glove delivery options",
    },
    Persona {
        name: "James",
        demographics: "52, gift buyer",
        device: Device::Desktop,
        motivation: "Needs gift wrapping and gift messages; leaves if unavailable",
    },
    Persona {
        name: "Sofia",
        demographics: "33, fashion-forward, brand conscious",
        device: Device::Mobile,
        motivation: "Judges the brand by imagery and checkout polish",
    },
    Persona {
        name: "Henrik",
        demographics: "60, collector",
        device: Device::Tablet,
        motivation: "Wants authenticity guarantees and insured shipping",
    },
    Persona {
        name: "Amara",
        demographics: "29, early adopter",
        device: Device::Mobile,
        motivation: "Expects express checkout and real-time order tracking",
    },
];

const MOBILE: [Persona; 5] = [
    Persona {
        name: "Kai",
        demographics: "24, one-handed phone shopper",
        device: Device::Mobile,
        motivation: "Abandons when tap targets are small or forms need zooming",
    },
    Persona {
        name: "Nadia",
        demographics: "36, shops during breaks",
        device: Device::Mobile,
        motivation: "Has two minutes; leaves on slow loads or long forms",
    },
    Persona {
        name: "Leo",
        demographics: "30, social media referral",
        device: Device::Mobile,
        motivation: "Arrives from an ad, expects the advertised price to carry through",
    },
    Persona {
        name: "Grace",
        demographics: "58, larger text settings",
        device: Device::Tablet,
        motivation: "Leaves when layouts break with accessibility settings",
    },
    Persona {
        name: "Omar",
        demographics: "27, weak connectivity",
        device: Device::Mobile,
        motivation: "Retries on timeouts; gives up after payment spinner stalls",
    },
];

const INTERNATIONAL: [Persona; 5] = [
    Persona {
        name: "Ingrid",
        demographics: "39, Sweden",
        device: Device::Desktop,
        motivation: "Needs local currency and clear duties; leaves on surprise import fees",
    },
    Persona {
        name: "Hiroshi",
        demographics: "44, Japan",
        device: Device::Mobile,
        motivation: "Expects address forms that fit Japanese formats",
    },
    Persona {
        name: "Lucia",
        demographics: "26, Brazil",
        device: Device::Mobile,
        motivation: "Looks for local payment methods and instalments",
    },
    Persona {
        name: "Aiden",
        demographics: "33, Australia",
        device: Device::Desktop,
        motivation: "Checks delivery times before committing",
    },
    Persona {
        name: "Fatima",
        demographics: "30, UAE",
        device: Device::Mobile,
        motivation: "Needs cash-on-delivery or trusted wallets and clear returns",
    },
];

impl PersonaMix {
    /// Every available mix.
    pub const ALL: [Self; 5] = [
        Self::Balanced,
        Self::Budget,
        Self::Luxury,
        Self::Mobile,
        Self::International,
    ];

    /// The five personas in this mix.
    #[must_use]
    pub const fn personas(self) -> &'static [Persona; 5] {
        match self {
            Self::Balanced => &BALANCED,
            Self::Budget => &BUDGET,
            Self::Luxury => &LUXURY,
            Self::Mobile => &MOBILE,
            Self::International => &INTERNATIONAL,
        }
    }

    /// Lowercase name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Budget => "budget",
            Self::Luxury => "luxury",
            Self::Mobile => "mobile",
            Self::International => "international",
        }
    }
}

impl fmt::Display for PersonaMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaMix {
    type Err = UnknownPersonaMix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|mix| mix.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownPersonaMix(s.to_string()))
    }
}
