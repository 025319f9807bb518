//! `SearchInstance` — one live, user-initiated search session: owns the
//! active query, the queued hub set, and the TTH → `GroupedSearchResult`
//! map that incoming results accumulate into.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use share_core::TTHValue;

use crate::listener::{EventBus, SearchInstanceEvent};
use crate::search::query::SearchQuery;
use crate::search::result::{GroupedSearchResult, SearchResult};

pub type InstanceToken = u64;

pub struct SearchInstance {
    pub token: InstanceToken,
    pub owner_id: String,
    expires_at: Option<Instant>,
    query: Option<SearchQuery>,
    search_token: String,
    queued_hub_urls: HashSet<String>,
    results: HashMap<TTHValue, GroupedSearchResult>,
    filtered_count: u64,
    last_search_at: Option<Instant>,
    events: EventBus<SearchInstanceEvent>,
}

impl SearchInstance {
    pub fn new(token: InstanceToken, owner_id: String, expires_in: Option<Duration>) -> Self {
        Self {
            token,
            owner_id,
            expires_at: expires_in.map(|d| Instant::now() + d),
            query: None,
            search_token: String::new(),
            queued_hub_urls: HashSet::new(),
            results: HashMap::new(),
            filtered_count: 0,
            last_search_at: None,
            events: EventBus::default(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SearchInstanceEvent> {
        self.events.subscribe()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|t| now >= t).unwrap_or(false)
    }

    /// Reset for a new hub search: clears grouped results and the queued
    /// hub set and records the new matcher/token, mirroring
    /// `SearchInstance::reset` cancelling any in-flight search.
    pub fn reset(&mut self, query: SearchQuery, search_token: String, hub_urls: HashSet<String>) {
        self.query = Some(query);
        self.search_token = search_token;
        self.queued_hub_urls = hub_urls;
        self.results.clear();
        self.filtered_count = 0;
        self.last_search_at = Some(Instant::now());
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn search_token(&self) -> &str {
        &self.search_token
    }

    /// Hub reports it sent the search immediately (not queued): drop it
    /// from the queued set and count it as sent.
    pub fn mark_hub_sent(&mut self, hub_url: &str) -> bool {
        let drained = self.queued_hub_urls.remove(hub_url);
        if self.queued_hub_urls.is_empty() {
            self.events.publish(SearchInstanceEvent::HubSearchSent { instance_id: self.token });
        }
        drained
    }

    pub fn mark_hub_disconnected(&mut self, hub_url: &str) {
        self.queued_hub_urls.remove(hub_url);
    }

    /// Accept an incoming result that matched this instance's search
    /// token, grouping it by TTH. Returns `true` if it was accepted
    /// (whether as a new group or a new child of an existing one).
    ///
    /// Per `SearchInstance`'s event contract: the first result for a TTH
    /// fires `GroupedResultAdded`, a later result for an already-grouped
    /// TTH fires `GroupedResultUpdated`, and every accepted result
    /// additionally fires `UserResult`.
    pub fn add_result(&mut self, result: SearchResult, match_relevance: f64, source_score_factor: f64) -> bool {
        if result.token != self.search_token {
            self.filtered_count += 1;
            return false;
        }

        let accepted_result = result.clone();
        match self.results.get_mut(&result.tth) {
            Some(existing) => {
                let accepted = existing.add_child_result(result);
                if !accepted {
                    self.filtered_count += 1;
                } else {
                    self.events.publish(SearchInstanceEvent::GroupedResultUpdated {
                        instance_id: self.token,
                        result: existing.clone(),
                    });
                    self.events.publish(SearchInstanceEvent::UserResult {
                        instance_id: self.token,
                        result: accepted_result,
                        parent: existing.clone(),
                    });
                }
                accepted
            }
            None => {
                let tth = result.tth;
                let grouped = GroupedSearchResult::new(result, match_relevance);
                self.events.publish(SearchInstanceEvent::GroupedResultAdded {
                    instance_id: self.token,
                    result: grouped.clone(),
                });
                self.events.publish(SearchInstanceEvent::UserResult {
                    instance_id: self.token,
                    result: accepted_result,
                    parent: grouped.clone(),
                });
                self.results.insert(tth, grouped);
                let _ = source_score_factor;
                true
            }
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn filtered_count(&self) -> u64 {
        self.filtered_count
    }

    pub fn queued_hub_count(&self) -> usize {
        self.queued_hub_urls.len()
    }

    /// Results sorted by `totalRelevance`, descending, for presentation.
    pub fn sorted_results(&self, source_score_factor: f64) -> Vec<&GroupedSearchResult> {
        let mut results: Vec<&GroupedSearchResult> = self.results.values().collect();
        results.sort_by(|a, b| {
            b.relevance
                .total_relevance(source_score_factor)
                .partial_cmp(&a.relevance.total_relevance(source_score_factor))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::result::{HintedUser, ResultType};
    use share_core::{CID, DirectoryContentInfo};

    fn result(user_byte: u8, tth: TTHValue, token: &str) -> SearchResult {
        SearchResult {
            id: SearchResult::next_id(),
            user: HintedUser {
                cid: CID([user_byte; 24]),
                hub_url: "adc://hub".into(),
            },
            result_type: ResultType::File,
            free_slots: 1,
            total_slots: 1,
            size: 10,
            adc_path: "/f.bin".into(),
            ip: None,
            tth,
            token: token.into(),
            date: 0,
            connection: String::new(),
            content_info: DirectoryContentInfo::UNINITIALIZED,
        }
    }

    #[test]
    fn results_with_wrong_token_are_filtered() {
        let mut instance = SearchInstance::new(1, "owner".into(), None);
        instance.reset(SearchQuery::new(vec![]), "tok-a".into(), HashSet::new());

        let accepted = instance.add_result(result(1, TTHValue::new([1u8; 24]), "tok-b"), 1.0, 1.0);
        assert!(!accepted);
        assert_eq!(instance.filtered_count(), 1);
        assert_eq!(instance.result_count(), 0);
    }

    #[test]
    fn grouping_dedups_by_tth_and_user() {
        let mut instance = SearchInstance::new(1, "owner".into(), None);
        instance.reset(SearchQuery::new(vec![]), "tok".into(), HashSet::new());

        let tth = TTHValue::new([2u8; 24]);
        assert!(instance.add_result(result(1, tth, "tok"), 1.0, 1.0));
        assert!(instance.add_result(result(2, tth, "tok"), 1.0, 1.0));
        assert!(!instance.add_result(result(1, tth, "tok"), 1.0, 1.0));

        assert_eq!(instance.result_count(), 1);
        let grouped = instance.sorted_results(1.0);
        assert_eq!(grouped[0].relevance.hits, 2);
    }

    #[test]
    fn grouping_fires_added_updated_and_user_result_events_in_order() {
        let mut instance = SearchInstance::new(1, "owner".into(), None);
        instance.reset(SearchQuery::new(vec![]), "tok".into(), HashSet::new());
        let mut events = instance.subscribe();

        let tth = TTHValue::new([5u8; 24]);
        assert!(instance.add_result(result(1, tth, "tok"), 1.0, 1.0));
        assert!(instance.add_result(result(2, tth, "tok"), 1.0, 1.0));
        assert!(!instance.add_result(result(1, tth, "tok"), 1.0, 1.0));

        assert!(matches!(events.try_recv().unwrap(), SearchInstanceEvent::GroupedResultAdded { .. }));
        assert!(matches!(events.try_recv().unwrap(), SearchInstanceEvent::UserResult { .. }));
        assert!(matches!(events.try_recv().unwrap(), SearchInstanceEvent::GroupedResultUpdated { .. }));
        assert!(matches!(events.try_recv().unwrap(), SearchInstanceEvent::UserResult { .. }));
        assert!(events.try_recv().is_err(), "the rejected third result must fire no further events");
    }

    #[test]
    fn hub_search_sent_fires_once_queue_drains() {
        let mut instance = SearchInstance::new(1, "owner".into(), None);
        let hubs = HashSet::from(["adc://a".to_string(), "adc://b".to_string()]);
        instance.reset(SearchQuery::new(vec![]), "tok".into(), hubs);
        let mut events = instance.subscribe();

        instance.mark_hub_sent("adc://a");
        assert!(events.try_recv().is_err());

        instance.mark_hub_sent("adc://b");
        assert!(matches!(events.try_recv().unwrap(), SearchInstanceEvent::HubSearchSent { .. }));
    }

    #[test]
    fn expiration_uses_absolute_instant() {
        let instance = SearchInstance::new(1, "owner".into(), Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(10));
        assert!(instance.is_expired(Instant::now()));
    }
}
