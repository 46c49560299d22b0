//! The Nation Ledger: single source of truth for every nation record.
//!
//! Owns the player nation, every AI country, wars, agreements, coalitions,
//! claims and fortifications. Every engine mutates state through the ledger;
//! nothing keeps a private copy of a country across a call.
//!
//! Countries live in a `BTreeMap` keyed by code, so every multi-country scan
//! runs in code order and replays identically.

use crate::bounded::Percent;
use crate::state::{
    sorted_pair, Agreement, AgreementId, AgreementKind, Claim, ClaimId, Coalition, CoalitionId,
    Country, CountryCode, Date, Disposition, Fortification, PlayerNation, War, WarId, WarOrigin,
    WarStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// World-level statistics for the victory evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldAggregate {
    /// Power of every live AI country plus the player
    pub total_power: f64,
    pub total_gdp: f64,
    pub count_by_disposition: BTreeMap<Disposition, usize>,
    pub max_ai_power: f64,
    pub max_ai_gdp: f64,
    pub player_power: f64,
    pub player_gdp: f64,
}

impl WorldAggregate {
    pub fn player_is_top_power(&self) -> bool {
        self.player_power > self.max_ai_power
    }

    pub fn player_is_top_gdp(&self) -> bool {
        self.player_gdp > self.max_ai_gdp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationLedger {
    pub player: PlayerNation,
    countries: BTreeMap<CountryCode, Country>,
    wars: BTreeMap<WarId, War>,
    agreements: BTreeMap<AgreementId, Agreement>,
    pub coalitions: BTreeMap<CoalitionId, Coalition>,
    pub claims: BTreeMap<ClaimId, Claim>,
    pub fortifications: Vec<Fortification>,
    /// Rejected proposals: (country, kind) -> date the suppression lifts
    proposal_cooldowns: BTreeMap<(CountryCode, AgreementKind), Date>,
    next_war_id: WarId,
    next_agreement_id: AgreementId,
    next_coalition_id: CoalitionId,
    next_claim_id: ClaimId,
}

impl NationLedger {
    pub fn new(player: PlayerNation) -> Self {
        Self {
            player,
            countries: BTreeMap::new(),
            wars: BTreeMap::new(),
            agreements: BTreeMap::new(),
            coalitions: BTreeMap::new(),
            claims: BTreeMap::new(),
            fortifications: Vec::new(),
            proposal_cooldowns: BTreeMap::new(),
            next_war_id: 1,
            next_agreement_id: 1,
            next_coalition_id: 1,
            next_claim_id: 1,
        }
    }

    pub fn player_code(&self) -> &str {
        &self.player.code
    }

    pub fn is_player(&self, code: &str) -> bool {
        self.player.code == code
    }

    // ------------------------------------------------------------------
    // Countries
    // ------------------------------------------------------------------

    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.get(code)
    }

    pub fn country_mut(&mut self, code: &str) -> Option<&mut Country> {
        self.countries.get_mut(code)
    }

    /// Returns the country, creating a default entity for unknown codes.
    ///
    /// Late-discovered territories show up as codes the ledger has never
    /// seen; they get a neutral placeholder instead of failing the tick.
    pub fn country_or_init(&mut self, code: &str) -> &mut Country {
        self.countries.entry(code.to_string()).or_insert_with(|| {
            log::debug!("Lazily initializing unknown country {}", code);
            let mut country = Country::new(code, code);
            country.recompute_power();
            country
        })
    }

    /// Inserts or replaces a country record.
    ///
    /// Seeded alliance and trade-partner sets are mirrored into agreement
    /// records so the two never disagree.
    pub fn upsert_country(&mut self, mut country: Country, date: Date) {
        let code = country.code.clone();
        country.allies.remove(&code);
        country.trade_partners.remove(&code);

        let mut allies: Vec<CountryCode> = country.allies.iter().cloned().collect();
        let mut partners: Vec<CountryCode> = country.trade_partners.iter().cloned().collect();
        for (other_code, other) in &self.countries {
            if other_code == &code {
                continue;
            }
            if other.allies.contains(&code) && !allies.contains(other_code) {
                allies.push(other_code.clone());
            }
            if other.trade_partners.contains(&code) && !partners.contains(other_code) {
                partners.push(other_code.clone());
            }
        }

        self.countries.insert(code.clone(), country);

        for ally in allies {
            if self.is_known(&ally) && !self.has_agreement(&code, &ally, AgreementKind::MilitaryAlliance)
            {
                self.sign_agreement(AgreementKind::MilitaryAlliance, &code, &ally, date);
            }
        }
        for partner in partners {
            if self.is_known(&partner)
                && !self.has_agreement(&code, &partner, AgreementKind::TradeAgreement)
            {
                self.sign_agreement(AgreementKind::TradeAgreement, &code, &partner, date);
            }
        }
    }

    fn is_known(&self, code: &str) -> bool {
        self.is_player(code) || self.countries.contains_key(code)
    }

    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    /// Codes of every country not yet annexed, in code order.
    pub fn active_codes(&self) -> Vec<CountryCode> {
        self.countries
            .values()
            .filter(|c| !c.is_annexed)
            .map(|c| c.code.clone())
            .collect()
    }

    /// Power of any party, player included.
    pub fn power_of(&self, code: &str) -> f64 {
        if self.is_player(code) {
            self.player.power()
        } else {
            self.countries.get(code).map(|c| c.power).unwrap_or(0.0)
        }
    }

    pub fn soldiers_of(&self, code: &str) -> u64 {
        if self.is_player(code) {
            self.player.soldiers
        } else {
            self.countries.get(code).map(|c| c.soldiers).unwrap_or(0)
        }
    }

    pub fn is_annexed(&self, code: &str) -> bool {
        self.countries.get(code).map(|c| c.is_annexed).unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Relations & disposition
    // ------------------------------------------------------------------

    /// Shifts a country's relations toward the player, clamped to [-100, 100].
    ///
    /// Returns the new score. The player has no score toward itself: its own
    /// code is ignored and yields 0.
    pub fn set_relations(&mut self, code: &str, delta: f64) -> f64 {
        if self.is_player(code) {
            log::debug!("Ignoring relations change of the player with itself");
            return 0.0;
        }
        self.country_or_init(code).relations.add(delta)
    }

    /// Disposition toward the player, derived from relations and war status.
    pub fn disposition(&self, code: &str) -> Option<Disposition> {
        let country = self.countries.get(code)?;
        Some(country.disposition(self.is_at_war(code)))
    }

    /// Whether the country is at war with the player.
    pub fn is_at_war(&self, code: &str) -> bool {
        self.are_at_war(&self.player.code, code)
    }

    pub fn are_at_war(&self, a: &str, b: &str) -> bool {
        self.active_war_between(a, b).is_some()
    }

    // ------------------------------------------------------------------
    // Wars
    // ------------------------------------------------------------------

    pub fn war(&self, id: WarId) -> Option<&War> {
        self.wars.get(&id)
    }

    pub fn war_mut(&mut self, id: WarId) -> Option<&mut War> {
        self.wars.get_mut(&id)
    }

    pub fn wars(&self) -> impl Iterator<Item = &War> {
        self.wars.values()
    }

    pub fn active_war_between(&self, a: &str, b: &str) -> Option<WarId> {
        self.wars
            .values()
            .find(|w| w.is_active() && w.between(a, b))
            .map(|w| w.id)
    }

    pub fn active_wars_of(&self, code: &str) -> Vec<WarId> {
        self.wars
            .values()
            .filter(|w| w.is_active() && w.involves(code))
            .map(|w| w.id)
            .collect()
    }

    /// Opens a war record. Returns the existing war if the pair is already fighting.
    pub fn open_war(
        &mut self,
        attacker: &str,
        defender: &str,
        origin: WarOrigin,
        date: Date,
    ) -> WarId {
        if let Some(existing) = self.active_war_between(attacker, defender) {
            return existing;
        }
        let id = self.next_war_id;
        self.next_war_id += 1;
        self.wars.insert(
            id,
            War {
                id,
                attacker: attacker.to_string(),
                defender: defender.to_string(),
                status: WarStatus::Active,
                attacker_occupation: Percent::default(),
                defender_occupation: Percent::default(),
                origin,
                start_date: date,
                end_date: None,
            },
        );
        id
    }

    /// Closes a war. Territory already transferred stays transferred.
    pub fn end_war(&mut self, id: WarId, date: Date) -> bool {
        match self.wars.get_mut(&id) {
            Some(war) if war.is_active() => {
                war.status = WarStatus::Ended;
                war.end_date = Some(date);
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Agreements
    // ------------------------------------------------------------------

    pub fn agreements(&self) -> impl Iterator<Item = &Agreement> {
        self.agreements.values()
    }

    pub fn agreements_of(&self, code: &str) -> Vec<&Agreement> {
        self.agreements.values().filter(|a| a.involves(code)).collect()
    }

    pub fn agreements_between(&self, a: &str, b: &str) -> Vec<&Agreement> {
        self.agreements.values().filter(|ag| ag.between(a, b)).collect()
    }

    pub fn has_agreement(&self, a: &str, b: &str, kind: AgreementKind) -> bool {
        self.agreements
            .values()
            .any(|ag| ag.kind == kind && ag.between(a, b))
    }

    /// Parties holding an agreement of `kind` with `code`, in code order.
    pub fn partners_of(&self, code: &str, kind: AgreementKind) -> Vec<CountryCode> {
        let mut partners: Vec<CountryCode> = self
            .agreements
            .values()
            .filter(|ag| ag.kind == kind)
            .filter_map(|ag| ag.other_party(code).cloned())
            .collect();
        partners.sort();
        partners.dedup();
        partners
    }

    /// Records an agreement and mirrors it into the parties' ally / trade sets.
    pub fn sign_agreement(
        &mut self,
        kind: AgreementKind,
        a: &str,
        b: &str,
        date: Date,
    ) -> AgreementId {
        if let Some(existing) = self
            .agreements
            .values()
            .find(|ag| ag.kind == kind && ag.between(a, b))
        {
            return existing.id;
        }
        let id = self.next_agreement_id;
        self.next_agreement_id += 1;
        self.agreements.insert(
            id,
            Agreement {
                id,
                kind,
                parties: sorted_pair(a, b),
                signed: date,
            },
        );
        self.mirror_agreement(kind, a, b, true);
        id
    }

    /// Removes every agreement between the pair. Returns what was voided.
    pub fn void_agreements_between(&mut self, a: &str, b: &str) -> Vec<Agreement> {
        let ids: Vec<AgreementId> = self
            .agreements
            .values()
            .filter(|ag| ag.between(a, b))
            .map(|ag| ag.id)
            .collect();
        let mut voided = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(ag) = self.agreements.remove(&id) {
                self.mirror_agreement(ag.kind, &ag.parties.0, &ag.parties.1, false);
                voided.push(ag);
            }
        }
        voided
    }

    /// Removes one agreement of `kind` between the pair.
    pub fn remove_agreement(&mut self, a: &str, b: &str, kind: AgreementKind) -> bool {
        let id = self
            .agreements
            .values()
            .find(|ag| ag.kind == kind && ag.between(a, b))
            .map(|ag| ag.id);
        match id.and_then(|id| self.agreements.remove(&id)) {
            Some(ag) => {
                self.mirror_agreement(ag.kind, &ag.parties.0, &ag.parties.1, false);
                true
            }
            None => false,
        }
    }

    fn mirror_agreement(&mut self, kind: AgreementKind, a: &str, b: &str, present: bool) {
        for (this, other) in [(a, b), (b, a)] {
            let Some(country) = self.countries.get_mut(this) else {
                continue;
            };
            let set = match kind {
                AgreementKind::MilitaryAlliance => &mut country.allies,
                AgreementKind::TradeAgreement => &mut country.trade_partners,
                _ => continue,
            };
            if present {
                set.insert(other.to_string());
            } else {
                set.remove(other);
            }
        }
    }

    pub fn proposal_blocked_until(&self, code: &str, kind: AgreementKind) -> Option<Date> {
        self.proposal_cooldowns
            .get(&(code.to_string(), kind))
            .copied()
    }

    pub fn block_proposal(&mut self, code: &str, kind: AgreementKind, until: Date) {
        self.proposal_cooldowns.insert((code.to_string(), kind), until);
    }

    // ------------------------------------------------------------------
    // Ids for engine-owned records
    // ------------------------------------------------------------------

    pub fn allocate_coalition_id(&mut self) -> CoalitionId {
        let id = self.next_coalition_id;
        self.next_coalition_id += 1;
        id
    }

    pub fn allocate_claim_id(&mut self) -> ClaimId {
        let id = self.next_claim_id;
        self.next_claim_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Annexation
    // ------------------------------------------------------------------

    /// Marks a country annexed. Terminal.
    ///
    /// Every active war it fights ends (the conquered outcome), its agreements
    /// are voided and it leaves all coalitions. Returns the wars that ended.
    /// Crises are owned by the crisis engine and are resolved by the caller.
    pub fn mark_annexed(&mut self, code: &str, date: Date) -> Vec<WarId> {
        let Some(country) = self.countries.get_mut(code) else {
            return Vec::new();
        };
        if country.is_annexed {
            return Vec::new();
        }
        country.is_annexed = true;
        country.territory_lost_percent.set(100.0);
        country.soldiers = 0;
        country.manpower = 0;
        country.power = 0.0;
        log::info!("{} has been annexed", code);

        let ended = self.active_wars_of(code);
        for &id in &ended {
            self.end_war(id, date);
        }

        let partners: Vec<CountryCode> = self
            .agreements_of(code)
            .iter()
            .filter_map(|ag| ag.other_party(code).cloned())
            .collect();
        for partner in partners {
            self.void_agreements_between(code, &partner);
        }

        for coalition in self.coalitions.values_mut() {
            coalition.members.remove(code);
        }

        ended
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    pub fn aggregate(&self) -> WorldAggregate {
        let mut agg = WorldAggregate {
            player_power: self.player.power(),
            player_gdp: self.player.gdp(),
            ..Default::default()
        };
        agg.total_power = agg.player_power;
        agg.total_gdp = agg.player_gdp;

        for country in self.countries.values().filter(|c| !c.is_annexed) {
            let gdp = country.gdp();
            agg.total_power += country.power;
            agg.total_gdp += gdp;
            agg.max_ai_power = agg.max_ai_power.max(country.power);
            agg.max_ai_gdp = agg.max_ai_gdp.max(gdp);
            *agg
                .count_by_disposition
                .entry(country.disposition(self.is_at_war(&country.code)))
                .or_insert(0) += 1;
        }

        agg
    }
}
