//! Mix group definitions from TOML (`[mix_groups.<name>]` tables)

use broker_domain::{MixMember, MixStrategy};
use serde::{Deserialize, Serialize};

/// One member reference inside a mix group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMixMemberConfig {
    pub provider: String,
    /// Overrides the provider's registry weight within this group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl FileMixMemberConfig {
    pub fn to_mix_member(&self) -> MixMember {
        let member = MixMember::new(self.provider.clone());
        match self.weight {
            Some(weight) => member.with_weight(weight),
            None => member,
        }
    }
}

/// Raw `[mix_groups.<name>]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMixGroupConfig {
    /// "max" or "avg" (default)
    pub strategy: MixStrategy,
    pub members: Vec<FileMixMemberConfig>,
}

impl FileMixGroupConfig {
    pub fn to_mix_members(&self) -> Vec<MixMember> {
        self.members.iter().map(|m| m.to_mix_member()).collect()
    }
}
