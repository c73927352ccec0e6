//! Hotel resolution pipeline through the public API, with recording collaborators

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rstest::rstest;

use travelbook::hotels::{
    AccessToken, Hotel, HotelOffers, HotelsByCity, LocationSearch, OfferDetails, PipelineStage,
    Price, ResolutionIssue, RoomOffer, TokenProvider,
};
use travelbook::{
    CityCode, HotelId, HotelOffer, HotelOfferBatch, HotelResolver, HotelSearchService,
    LocationQuery, PipelineSettings, ResolvedOfferSet, TravelBookError,
};

const TOKEN: &str = "token-123";

fn offer(hotel_id: &str) -> HotelOffer {
    HotelOffer {
        hotel: Hotel {
            hotel_id: HotelId::new(hotel_id),
            name: format!("Hotel {hotel_id}"),
            city_code: Some("DEL".to_string()),
            address: None,
            rating: Some(4),
            latitude: None,
            longitude: None,
        },
        available: true,
        offers: vec![RoomOffer {
            id: format!("OF-{hotel_id}"),
            check_in_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            room_category: Some("STANDARD_ROOM".to_string()),
            room_description: None,
            adults: Some(2),
            price: Price {
                currency: "INR".to_string(),
                base: None,
                total: "5400.00".to_string(),
            },
        }],
    }
}

fn ids(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("DEL{i:03}")).collect()
}

/// Scripted collaborators that record every call they receive
#[derive(Default)]
struct Recorder {
    token_absent: bool,
    city: Option<&'static str>,
    location_fails: bool,
    hotel_ids: Vec<String>,
    hotels_fail: bool,
    /// Offers returned per batch index; a missing entry returns one offer per id
    offers_per_batch: Vec<usize>,
    failing_batches: HashSet<usize>,
    hanging_batches: HashSet<usize>,
    /// Earlier batches sleep longer, so they finish last when run together
    staggered: bool,

    token_calls: Mutex<usize>,
    location_calls: Mutex<Vec<String>>,
    hotel_calls: Mutex<Vec<String>>,
    batch_calls: Mutex<Vec<Vec<String>>>,
    seen_tokens: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    finished_batches: Mutex<Vec<usize>>,
}

impl Recorder {
    fn delhi(hotel_count: usize) -> Self {
        Self {
            city: Some("DEL"),
            hotel_ids: ids(hotel_count),
            ..Self::default()
        }
    }

    fn saw(&self, token: &AccessToken) {
        self.seen_tokens
            .lock()
            .unwrap()
            .push(token.secret().to_string());
    }

    fn batch_calls(&self) -> Vec<Vec<String>> {
        self.batch_calls.lock().unwrap().clone()
    }

    fn downstream_calls(&self) -> usize {
        self.location_calls.lock().unwrap().len()
            + self.hotel_calls.lock().unwrap().len()
            + self.batch_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenProvider for Recorder {
    async fn get_token(&self) -> travelbook::Result<AccessToken> {
        *self.token_calls.lock().unwrap() += 1;
        if self.token_absent {
            return Err(TravelBookError::authentication("credentials rejected"));
        }
        Ok(AccessToken::new(TOKEN))
    }
}

#[async_trait]
impl LocationSearch for Recorder {
    async fn search(
        &self,
        query: &LocationQuery,
        token: &AccessToken,
    ) -> travelbook::Result<Option<CityCode>> {
        self.saw(token);
        self.location_calls
            .lock()
            .unwrap()
            .push(query.as_str().to_string());
        if self.location_fails {
            return Err(TravelBookError::api(500, "location search down"));
        }
        self.city.map(CityCode::new).transpose()
    }
}

#[async_trait]
impl HotelsByCity for Recorder {
    async fn lookup(
        &self,
        city: &CityCode,
        token: &AccessToken,
    ) -> travelbook::Result<Vec<HotelId>> {
        self.saw(token);
        self.hotel_calls
            .lock()
            .unwrap()
            .push(city.as_str().to_string());
        if self.hotels_fail {
            return Err(TravelBookError::network("connection reset"));
        }
        Ok(self.hotel_ids.iter().map(HotelId::new).collect())
    }
}

#[async_trait]
impl HotelOffers for Recorder {
    async fn lookup(
        &self,
        batch: &HotelOfferBatch,
        token: &AccessToken,
    ) -> travelbook::Result<Vec<HotelOffer>> {
        self.saw(token);
        let batch_ids: Vec<String> = batch
            .hotel_ids()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        self.batch_calls.lock().unwrap().push(batch_ids.clone());

        if self.staggered {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

            let batch_count = self.hotel_ids.len().div_ceil(5);
            let delay = (batch_count - batch.index()) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished_batches.lock().unwrap().push(batch.index());
        }
        if self.hanging_batches.contains(&batch.index()) {
            std::future::pending::<()>().await;
        }
        if self.failing_batches.contains(&batch.index()) {
            return Err(TravelBookError::rate_limit("too many requests"));
        }

        let count = self
            .offers_per_batch
            .get(batch.index())
            .copied()
            .unwrap_or(batch_ids.len());
        Ok(batch_ids.iter().take(count).map(|id| offer(id)).collect())
    }
}

#[async_trait]
impl OfferDetails for Recorder {
    async fn details(
        &self,
        _offer_id: &str,
        token: &AccessToken,
    ) -> travelbook::Result<Option<HotelOffer>> {
        self.saw(token);
        Ok(None)
    }
}

fn resolver(recorder: &Arc<Recorder>, settings: PipelineSettings) -> HotelResolver {
    HotelResolver::new(recorder.clone(), recorder.clone(), recorder.clone(), settings)
}

fn service(recorder: &Arc<Recorder>) -> HotelSearchService {
    HotelSearchService::new(
        recorder.clone(),
        resolver(recorder, PipelineSettings::default()),
        recorder.clone(),
    )
}

fn delhi() -> LocationQuery {
    LocationQuery::new("Delhi").unwrap()
}

fn offer_ids(result: &ResolvedOfferSet) -> Vec<&str> {
    result
        .offers()
        .iter()
        .map(|o| o.hotel.hotel_id.as_str())
        .collect()
}

#[tokio::test]
async fn test_delhi_scenario() {
    let recorder = Arc::new(Recorder {
        offers_per_batch: vec![3, 1],
        ..Recorder::delhi(7)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert_eq!(*recorder.location_calls.lock().unwrap(), vec!["Delhi"]);
    assert_eq!(*recorder.hotel_calls.lock().unwrap(), vec!["DEL"]);

    let batches = recorder.batch_calls();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 5);
    assert_eq!(batches[1].len(), 2);

    assert_eq!(result.len(), 4);
    assert_eq!(
        offer_ids(&result),
        vec!["DEL001", "DEL002", "DEL003", "DEL006"]
    );
    assert_eq!(result.city_code().map(CityCode::as_str), Some("DEL"));
    assert_eq!(result.hotel_count(), 7);
    assert_eq!(result.batch_count(), 2);
    assert!(result.is_complete());
    assert!(result.issues().is_empty());
}

#[tokio::test]
async fn test_location_not_found_makes_no_further_calls() {
    let recorder = Arc::new(Recorder {
        city: None,
        ..Recorder::delhi(7)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert!(result.is_empty());
    assert!(recorder.hotel_calls.lock().unwrap().is_empty());
    assert!(recorder.batch_calls().is_empty());
    assert_eq!(result.stopped_at(), Some(PipelineStage::ResolvingCity));
    assert!(matches!(
        &result.issues()[0],
        ResolutionIssue::NoLocationMatch { reason: None, .. }
    ));
}

#[tokio::test]
async fn test_location_failure_is_not_fatal() {
    let recorder = Arc::new(Recorder {
        location_fails: true,
        ..Recorder::delhi(7)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert!(result.is_empty());
    assert!(recorder.hotel_calls.lock().unwrap().is_empty());
    assert!(matches!(
        &result.issues()[0],
        ResolutionIssue::NoLocationMatch { reason: Some(_), .. }
    ));
}

#[rstest]
#[case::empty_city(false)]
#[case::lookup_failed(true)]
#[tokio::test]
async fn test_no_hotels_makes_no_offer_calls(#[case] hotels_fail: bool) {
    let recorder = Arc::new(Recorder {
        hotels_fail,
        ..Recorder::delhi(0)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert!(result.is_empty());
    assert!(recorder.batch_calls().is_empty());
    assert_eq!(result.stopped_at(), Some(PipelineStage::ResolvingHotelIds));
    assert_eq!(result.city_code().map(CityCode::as_str), Some("DEL"));
    assert!(matches!(
        &result.issues()[0],
        ResolutionIssue::NoHotelsInCity { .. }
    ));
}

#[rstest]
#[case(1, 1)]
#[case(5, 1)]
#[case(6, 2)]
#[case(10, 2)]
#[case(11, 3)]
#[case(23, 5)]
#[tokio::test]
async fn test_batches_cover_ids_in_order(#[case] hotel_count: usize, #[case] expected: usize) {
    let recorder = Arc::new(Recorder::delhi(hotel_count));

    let result = service(&recorder).search(&delhi()).await;

    let batches = recorder.batch_calls();
    assert_eq!(batches.len(), expected);
    assert_eq!(batches.len(), hotel_count.div_ceil(5));
    assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() <= 5));
    assert_eq!(batches.concat(), ids(hotel_count));
    assert_eq!(result.len(), hotel_count);
}

#[tokio::test]
async fn test_failed_middle_batch_is_isolated() {
    let recorder = Arc::new(Recorder {
        failing_batches: HashSet::from([1]),
        ..Recorder::delhi(15)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert_eq!(recorder.batch_calls().len(), 3);
    let mut expected = ids(5);
    expected.extend(ids(15).into_iter().skip(10));
    assert_eq!(offer_ids(&result), expected);
    assert_eq!(result.failed_batches(), vec![1]);
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_all_batches_failing_is_still_empty_result() {
    let recorder = Arc::new(Recorder {
        failing_batches: HashSet::from([0, 1]),
        ..Recorder::delhi(7)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert!(result.is_empty());
    assert_eq!(result.failed_batches(), vec![0, 1]);
    assert_eq!(result.stopped_at(), None);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let recorder = Arc::new(Recorder {
        failing_batches: HashSet::from([2]),
        offers_per_batch: vec![4, 2, 0, 5],
        ..Recorder::delhi(18)
    });
    let service = service(&recorder);

    let first = service.search(&delhi()).await;
    let second = service.search(&delhi()).await;

    assert_eq!(first.offers(), second.offers());
    assert_eq!(first.issues(), second.issues());
    assert_eq!(*recorder.token_calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_absent_token_makes_no_downstream_calls() {
    let recorder = Arc::new(Recorder {
        token_absent: true,
        ..Recorder::delhi(7)
    });

    let result = service(&recorder).search(&delhi()).await;

    assert!(result.is_empty());
    assert_eq!(recorder.downstream_calls(), 0);
    assert_eq!(result.stopped_at(), Some(PipelineStage::AcquiringToken));
    assert!(matches!(
        &result.issues()[0],
        ResolutionIssue::TokenUnavailable { .. }
    ));
}

#[tokio::test]
async fn test_one_token_threaded_through_every_call() {
    let recorder = Arc::new(Recorder::delhi(12));

    service(&recorder).search(&delhi()).await;

    assert_eq!(*recorder.token_calls.lock().unwrap(), 1);
    let seen = recorder.seen_tokens.lock().unwrap();
    assert_eq!(seen.len(), 1 + 1 + 3);
    assert!(seen.iter().all(|token| token == TOKEN));
}

#[tokio::test]
async fn test_location_text_is_passed_through_unchanged() {
    let recorder = Arc::new(Recorder::delhi(1));

    let query = LocationQuery::new("  new delhi ").unwrap();
    service(&recorder).search(&query).await;

    assert_eq!(*recorder.location_calls.lock().unwrap(), vec!["  new delhi "]);
}

#[tokio::test]
async fn test_hanging_batch_times_out_and_is_skipped() {
    let recorder = Arc::new(Recorder {
        hanging_batches: HashSet::from([0]),
        ..Recorder::delhi(7)
    });
    let settings = PipelineSettings {
        call_timeout: Duration::from_millis(50),
        max_concurrent_batches: 1,
    };

    let result = resolver(&recorder, settings)
        .resolve_offers(&delhi(), &AccessToken::new(TOKEN))
        .await;

    assert_eq!(offer_ids(&result), vec!["DEL006", "DEL007"]);
    assert_eq!(result.failed_batches(), vec![0]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(8)]
#[tokio::test]
async fn test_concurrent_batches_keep_discovery_order(#[case] concurrency: usize) {
    let recorder = Arc::new(Recorder {
        failing_batches: HashSet::from([3]),
        ..Recorder::delhi(32)
    });
    let settings = PipelineSettings {
        max_concurrent_batches: concurrency,
        ..PipelineSettings::default()
    };

    let result = resolver(&recorder, settings)
        .resolve_offers(&delhi(), &AccessToken::new(TOKEN))
        .await;

    let expected: Vec<String> = ids(32)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i / 5 != 3)
        .map(|(_, id)| id)
        .collect();
    assert_eq!(offer_ids(&result), expected);
    assert_eq!(recorder.batch_calls().len(), 7);
}

#[tokio::test]
async fn test_single_batch_concurrency_runs_batches_one_at_a_time() {
    let recorder = Arc::new(Recorder {
        staggered: true,
        ..Recorder::delhi(40)
    });
    let settings = PipelineSettings {
        max_concurrent_batches: 1,
        ..PipelineSettings::default()
    };

    let result = resolver(&recorder, settings)
        .resolve_offers(&delhi(), &AccessToken::new(TOKEN))
        .await;

    assert_eq!(offer_ids(&result), ids(40));
    assert_eq!(recorder.peak_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(
        *recorder.finished_batches.lock().unwrap(),
        (0..8).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_out_of_order_completion_keeps_discovery_order() {
    let recorder = Arc::new(Recorder {
        staggered: true,
        ..Recorder::delhi(40)
    });
    let settings = PipelineSettings {
        max_concurrent_batches: 4,
        ..PipelineSettings::default()
    };

    let result = resolver(&recorder, settings)
        .resolve_offers(&delhi(), &AccessToken::new(TOKEN))
        .await;

    let peak = recorder.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak > 1 && peak <= 4, "peak in flight was {peak}");

    let finished = recorder.finished_batches.lock().unwrap().clone();
    let mut sorted = finished.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..8).collect::<Vec<_>>());
    assert_ne!(finished, sorted, "batches should finish out of order");

    assert_eq!(offer_ids(&result), ids(40));
    assert_eq!(result.batch_count(), 8);
}

#[tokio::test]
async fn test_offer_details_uses_fresh_token() {
    let recorder = Arc::new(Recorder::delhi(0));

    let found = service(&recorder).offer_details("OF-1").await.unwrap();

    assert!(found.is_none());
    assert_eq!(*recorder.token_calls.lock().unwrap(), 1);
    assert_eq!(*recorder.seen_tokens.lock().unwrap(), vec![TOKEN]);
}
