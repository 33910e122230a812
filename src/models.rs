use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Free-text note for one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Entry in the customer directory; payload of a `Customers` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
}

/// One recorded customer visit (an `info` document).
///
/// `created_at` is kept by the store alongside the payload, so it is not part
/// of the serialized fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitEntry {
    pub customer_name: String,
    pub selected_purposes: Vec<Purpose>,
    pub buyer: String,
    pub sales_options: Vec<SalesOption>,
    pub sample_collection_types: Vec<SampleType>,
    pub remarks: BTreeMap<String, String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl Default for VisitEntry {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            selected_purposes: Vec::new(),
            buyer: String::new(),
            sales_options: Vec::new(),
            sample_collection_types: Vec::new(),
            remarks: BTreeMap::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Generates `ALL`, `label()`, `Display` and a forgiving `FromStr` for the
/// form's option enums. Parsing ignores case and treats `-`/`_` as spaces so
/// `new-inquiry` on the command line matches `new inquiry`.
macro_rules! option_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().to_lowercase() == wanted)
                    .ok_or_else(|| format!("unknown {}: '{}'", stringify!($name), s))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Sales,
    Admin,
}

option_enum!(Purpose {
    Sales => "Sales",
    Admin => "Admin",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SalesOption {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "new inquiry")]
    NewInquiry,
    #[serde(rename = "sample collection")]
    SampleCollection,
    #[serde(rename = "sample submission")]
    SampleSubmission,
}

option_enum!(SalesOption {
    Regular => "regular",
    NewInquiry => "new inquiry",
    SampleCollection => "sample collection",
    SampleSubmission => "sample submission",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SampleType {
    #[serde(rename = "fabric")]
    Fabric,
    #[serde(rename = "interline")]
    Interline,
}

option_enum!(SampleType {
    Fabric => "fabric",
    Interline => "interline",
});

/// Keys of the free-text remark fields a visit can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RemarkKey {
    Fabric,
    Interline,
    SampleSubmission,
    Regular,
    NewInquiry,
    Payment,
    Svat,
    Grn,
}

option_enum!(RemarkKey {
    Fabric => "fabric",
    Interline => "interline",
    SampleSubmission => "sample submission",
    Regular => "regular",
    NewInquiry => "new inquiry",
    Payment => "payment",
    Svat => "svat",
    Grn => "grn",
});
