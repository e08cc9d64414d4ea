//! Cosponsor rosters for bill detail pages.

use crate::congress::BillKey;
use crate::error::Result;
use crate::repository::{BillRepository, BillRowId, CommitteeAssignment, CosponsorRow, Legislator};
use crate::types::{BillCommittee, Cosponsor, Sponsor};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Committee id -> committee name, in first-seen order
pub type CommitteesMap = IndexMap<String, String>;

/// Bill committees with repeated committee ids removed (first one wins).
/// Entries without an id or a name are dropped.
pub fn dedupe_committees(committees: &[BillCommittee]) -> Vec<BillCommittee> {
    let mut seen = std::collections::HashSet::new();
    committees
        .iter()
        .filter(|c| match (&c.committee_id, &c.committee) {
            (Some(id), Some(name)) => !id.is_empty() && !name.is_empty(),
            _ => false,
        })
        .filter(|c| seen.insert(c.committee_id.clone()))
        .cloned()
        .collect()
}

pub fn committees_map(committees: &[BillCommittee]) -> CommitteesMap {
    dedupe_committees(committees)
        .into_iter()
        .filter_map(|c| Some((c.committee_id?, c.committee?)))
        .collect()
}

/// A legislator's cosponsorships across a set of identical bills
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedCosponsor {
    #[serde(flatten)]
    pub row: CosponsorRow,
    pub bill_congress_type_numbers: Vec<BillKey>,
    /// Names of this legislator's committees that the current bill was referred to
    pub committees_named: Vec<String>,
    pub ranks: Vec<Option<Value>>,
}

fn relevant_committees<'a>(
    assignments: &'a [CommitteeAssignment],
    committees: &'a CommitteesMap,
) -> impl Iterator<Item = (&'a CommitteeAssignment, &'a String)> {
    assignments.iter().filter_map(move |assignment| {
        let id = assignment.committee.as_ref()?;
        committees.get(id).map(|name| (assignment, name))
    })
}

/// Merge the cosponsors of `identical` (plus `current`) into one entry per
/// bioguide id, in the order legislators are first returned by the repository.
pub fn merge_roster(
    identical: &[BillKey],
    current: &BillKey,
    committees: &CommitteesMap,
    repo: &dyn BillRepository,
) -> Result<Vec<MergedCosponsor>> {
    let mut keys = identical.to_vec();
    if !keys.contains(current) {
        keys.insert(0, current.clone());
    }

    let mut ids = Vec::with_capacity(keys.len());
    let mut key_by_id: HashMap<BillRowId, BillKey> = HashMap::new();
    for key in keys {
        let id = repo.bill_row_id(&key)?;
        ids.push(id);
        key_by_id.insert(id, key);
    }

    let mut merged: IndexMap<String, MergedCosponsor> = IndexMap::new();
    for row in repo.cosponsor_rows(&ids)? {
        let key = key_by_id.get(&row.bill).cloned().unwrap_or_default();

        if let Some(existing) = merged.get_mut(&row.bioguide_id) {
            existing.bill_congress_type_numbers.push(key);
            continue;
        }

        let (ranks, committees_named): (Vec<Option<Value>>, Vec<String>) =
            relevant_committees(&row.committees, committees)
                .map(|(assignment, name)| (assignment.rank.clone(), name.clone()))
                .unzip();

        merged.insert(
            row.bioguide_id.clone(),
            MergedCosponsor {
                row,
                bill_congress_type_numbers: vec![key],
                committees_named,
                ranks,
            },
        );
    }

    Ok(merged.into_values().collect())
}

/// A sponsor or cosponsor row as shown on the detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayCosponsor {
    pub name: Option<String>,
    pub bioguide_id: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub district: Option<Value>,
    pub original_cosponsor: bool,
    pub sponsor: bool,
    pub rank: Option<Value>,
    pub current: bool,
    pub name_full_official: Option<String>,
    pub committee_id: Option<String>,
    pub committee_name: Option<String>,
}

impl DisplayCosponsor {
    fn integer_rank(&self) -> Option<i64> {
        self.rank.as_ref().and_then(Value::as_i64)
    }

    /// `[D-CA12]` style bracket
    pub fn bracket(&self) -> String {
        sponsor_bracket(
            self.party.as_deref(),
            self.state.as_deref(),
            self.district.as_ref(),
        )
    }
}

impl From<&Cosponsor> for DisplayCosponsor {
    fn from(c: &Cosponsor) -> Self {
        Self {
            name: c.name.clone(),
            bioguide_id: c.bioguide_id.clone(),
            party: c.party.clone(),
            state: c.state.clone(),
            district: c.district.clone(),
            original_cosponsor: c.is_original(),
            rank: c.rank.clone(),
            ..Self::default()
        }
    }
}

impl From<&Sponsor> for DisplayCosponsor {
    fn from(s: &Sponsor) -> Self {
        Self {
            name: s.name.clone(),
            bioguide_id: s.bioguide_id.clone(),
            party: s.party.clone(),
            state: s.state.clone(),
            district: s.district.clone(),
            sponsor: true,
            ..Self::default()
        }
    }
}

/// `[<party>-<state><district>]`; party defaults to `X`
pub fn sponsor_bracket(
    party: Option<&str>,
    state: Option<&str>,
    district: Option<&Value>,
) -> String {
    let district = match district {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    format!(
        "[{}-{}{}]",
        party.filter(|p| !p.is_empty()).unwrap_or("X"),
        state.unwrap_or(""),
        district
    )
}

/// Result of looking up one cosponsor in the repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LookupOutcome {
    Ok,
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupEntry {
    pub bioguide_id: String,
    pub outcome: LookupOutcome,
}

/// Per-cosponsor lookup outcomes from [`order_cosponsors`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupReport {
    pub entries: Vec<LookupEntry>,
}

impl LookupReport {
    pub fn skipped(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, LookupOutcome::Skipped(_)))
    }
}

fn apply_legislator(
    entry: &mut DisplayCosponsor,
    legislator: &Legislator,
    committees: &[BillCommittee],
) {
    entry.current = true;
    entry.party = legislator.party.clone();
    entry.name_full_official = legislator.name_full_official.clone();

    for assignment in &legislator.committees {
        if assignment.bioguide.as_deref() != Some(legislator.bioguide_id.as_str()) {
            continue;
        }
        let Some(committee_id) = assignment.committee.as_deref() else {
            continue;
        };
        for committee in committees {
            if committee.committee_id.as_deref() == Some(committee_id) {
                entry.committee_id = Some(committee_id.to_string());
                entry.rank = assignment.rank.clone();
                entry.committee_name = committee.committee.clone();
            }
        }
    }
}

/// Order a bill's cosponsors for display.
///
/// The sponsor goes first: a cosponsor with the sponsor's name is moved to the
/// front, otherwise the sponsor is inserted. Everyone with a bioguide id is
/// looked up in `repo`. The rest are grouped original-ranked, original-unranked,
/// other-ranked, other-unranked, with ranked groups stably sorted by rank.
pub fn order_cosponsors(
    sponsor: Option<&Sponsor>,
    cosponsors: &[Cosponsor],
    committees: &[BillCommittee],
    repo: &dyn BillRepository,
) -> (Vec<DisplayCosponsor>, LookupReport) {
    let mut list: Vec<DisplayCosponsor> = cosponsors.iter().map(DisplayCosponsor::from).collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(sponsor) = sponsor {
        let name = sponsor.name.as_deref().unwrap_or("");
        let position = if name.is_empty() {
            None
        } else {
            list.iter().position(|c| c.name.as_deref() == Some(name))
        };
        let head = match position {
            Some(i) => {
                let mut moved = list.remove(i);
                moved.sponsor = true;
                moved
            }
            None => DisplayCosponsor::from(sponsor),
        };
        list.insert(0, head);
    }

    let mut report = LookupReport::default();
    for entry in list.iter_mut() {
        let Some(bioguide_id) = entry.bioguide_id.clone().filter(|id| !id.is_empty()) else {
            continue;
        };
        let outcome = match repo.legislator(&bioguide_id) {
            Ok(Some(legislator)) => {
                apply_legislator(entry, &legislator, committees);
                LookupOutcome::Ok
            }
            Ok(None) => {
                entry.current = false;
                LookupOutcome::Skipped("no legislator with this bioguide id".to_string())
            }
            Err(e) => {
                entry.current = false;
                LookupOutcome::Skipped(e.to_string())
            }
        };
        if let LookupOutcome::Skipped(reason) = &outcome {
            debug!("Cosponsor lookup skipped for {}: {}", bioguide_id, reason);
        }
        report.entries.push(LookupEntry {
            bioguide_id,
            outcome,
        });
    }

    if list.is_empty() {
        return (list, report);
    }
    let rest = list.split_off(1);

    let (original, unoriginal): (Vec<_>, Vec<_>) =
        rest.into_iter().partition(|c| c.original_cosponsor);
    let ranked_then_unranked = |group: Vec<DisplayCosponsor>| {
        let (mut ranked, unranked): (Vec<_>, Vec<_>) =
            group.into_iter().partition(|c| c.integer_rank().is_some());
        ranked.sort_by_key(|c| c.integer_rank());
        ranked.into_iter().chain(unranked)
    };

    list.extend(ranked_then_unranked(original));
    list.extend(ranked_then_unranked(unoriginal));
    (list, report)
}
