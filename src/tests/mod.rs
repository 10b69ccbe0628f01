use std::convert::Infallible;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::catalog::{Catalog, Product};
use crate::coordinator::{self, FilterCycle, InputCoordinator, InputEvent};
use crate::filter::{filter, FilterState, ProductFilter};
use crate::highlight::Highlighter;
use crate::session::{Document, Session};

const SHIPPED: &str = include_str!("../../data/catalog.yml");

fn shipped() -> Catalog {
    Catalog::from_yaml_str(SHIPPED).unwrap()
}

fn skus(products: &[&Product]) -> Vec<String> {
    products.iter().map(|p| p.sku.clone()).collect()
}

#[test]
fn shipped_dataset_loads() {
    let catalog = shipped();
    assert_eq!(catalog.region_ids().collect::<Vec<_>>(), ["us", "eu", "uk"]);
    assert_eq!(catalog.default_region(), Some("us"));
    assert_eq!(catalog.currency("eu"), Some("EUR"));
    assert!(catalog.products("us").len() > 10);
}

#[test]
fn empty_filters_keep_every_product() {
    let catalog = shipped();
    for (_, region) in catalog.regions() {
        for p in region.products.iter() {
            let out = filter(std::slice::from_ref(p), None, None, "");
            assert_eq!(out, vec![p]);
            let out = filter(std::slice::from_ref(p), Some(""), Some(""), "");
            assert_eq!(out, vec![p]);
        }
    }
}

#[test]
fn category_filter_only_returns_that_category() {
    let catalog = shipped();
    for id in catalog.region_ids() {
        let products = catalog.products(id);
        let options = crate::sync::populate_filters(products);
        for category in options.categories.iter() {
            let out = filter(products, Some(category.as_str()), None, "");
            assert!(!out.is_empty());
            assert!(out
                .iter()
                .all(|p| p.main_category.as_deref() == Some(category.as_str())));
        }
    }
}

#[test]
fn filtering_preserves_source_order() {
    let catalog = shipped();
    let products = catalog.products("us");
    let out = filter(products, None, None, "round");
    let positions: Vec<usize> = out
        .iter()
        .map(|p| products.iter().position(|q| q.sku == p.sku).unwrap())
        .collect();
    assert!(positions.len() > 2);
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn single_pass_matches_sequential_filters() {
    let catalog = shipped();
    let queries = ["", "steel", "ROUND", "0.188", "mm", " 10 ft ", "nothing-here"];
    for id in catalog.region_ids() {
        let products = catalog.products(id);
        let options = crate::sync::populate_filters(products);
        let mut categories: Vec<Option<&str>> = vec![None];
        categories.extend(options.categories.iter().map(|c| Some(c.as_str())));
        let mut subs: Vec<Option<&str>> = vec![None];
        subs.extend(options.sub_categories.iter().map(|s| Some(s.as_str())));

        for category in categories.iter().copied() {
            for sub in subs.iter().copied() {
                for query in queries.iter().copied() {
                    let combined = filter(products, category, sub, query);

                    let by_category = ProductFilter::new(category, None, "");
                    let by_sub = ProductFilter::new(None, sub, "");
                    let by_query = ProductFilter::new(None, None, query);
                    let sequential: Vec<&Product> = products
                        .iter()
                        .filter(|p| by_category.matches(p))
                        .collect::<Vec<_>>()
                        .into_iter()
                        .filter(|p| by_sub.matches(p))
                        .collect::<Vec<_>>()
                        .into_iter()
                        .filter(|p| by_query.matches(p))
                        .collect();

                    assert_eq!(
                        skus(&combined),
                        skus(&sequential),
                        "region={id} category={category:?} sub={sub:?} query={query:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn query_dot_is_literal() {
    let products = vec![
        Product::new("a.b-100").with_category("Steel Poles", "Round Straight"),
        Product::new("axb-200").with_category("Steel Poles", "Round Straight"),
        Product::new("ab-300").with_category("Steel Poles", "Round Straight"),
    ];
    let out = filter(&products, None, None, "a.b");
    assert_eq!(skus(&out), ["a.b-100"]);

    let h = Highlighter::new("a.b");
    assert_eq!(h.highlight("axb-200"), "axb-200");
    assert_eq!(h.highlight("a.b-100"), "<mark>a.b</mark>-100");
}

#[test]
fn query_is_case_insensitive() {
    let products = vec![Product::new("steel-pole-10")];
    let out = filter(&products, None, None, "STEEL");
    assert_eq!(skus(&out), ["steel-pole-10"]);
    assert_eq!(
        Highlighter::new("STEEL").highlight("steel-pole-10"),
        "<mark>steel</mark>-pole-10"
    );
}

#[test]
fn unknown_region_yields_no_products() {
    let catalog = shipped();
    let state = FilterState::new("mars");
    assert!(state.apply(&catalog).is_empty());
    assert!(crate::sync::populate_region(&catalog, "mars").categories.is_empty());
}

#[test]
fn region_switch_repopulates_dropdowns_in_first_seen_order() {
    let catalog = shipped();
    let mut state = FilterState::new("us");
    state.set_category(Some("Aluminum Poles".to_string()));
    let mut session = Session::new(&catalog, state.clone(), Document::default());
    assert_eq!(
        session.view().categories(),
        ["Steel Poles", "Aluminum Poles", "Fiberglass Poles", "Accessories"]
    );

    let mut coordinator = InputCoordinator::new(state, Duration::from_millis(200));
    let t0 = Instant::now();
    coordinator.on_input(InputEvent::Region("uk".to_string()), t0);
    let cycle = coordinator
        .poll_expired(t0 + Duration::from_millis(200))
        .unwrap();
    assert!(cycle.region_changed);
    assert_eq!(cycle.state.category, None);

    session.apply(cycle);
    assert_eq!(session.view().categories(), ["Steel Poles", "Accessories"]);
    assert_eq!(
        session.view().sub_categories(),
        ["Round Straight", "Stepped", "Access Doors"]
    );
    assert_eq!(session.matches().len(), 4);
    assert!(session.view().body().contains("UK-SP-S-8-4"));
    assert!(!session.view().body().contains("SP-R-10-120"));
}

#[tokio::test(start_paused = true)]
async fn burst_of_input_runs_one_cycle() {
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = InputCoordinator::new(FilterState::new("us"), Duration::from_millis(200));
    let start = Instant::now();

    let typist = tokio::spawn(async move {
        tx.send(InputEvent::Query("s".to_string())).unwrap();
        sleep(Duration::from_millis(50)).await;
        tx.send(InputEvent::Query("st".to_string())).unwrap();
        sleep(Duration::from_millis(50)).await;
        tx.send(InputEvent::Query("ste".to_string())).unwrap();
        sleep(Duration::from_millis(1000)).await;
    });

    let mut cycles: Vec<(Duration, FilterCycle)> = Vec::new();
    coordinator::run(coordinator, rx, |cycle| {
        cycles.push((start.elapsed(), cycle));
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();
    typist.await.unwrap();

    assert_eq!(cycles.len(), 1);
    let (at, cycle) = &cycles[0];
    assert!(*at >= Duration::from_millis(300), "fired at {at:?}");
    assert!(*at < Duration::from_millis(310), "fired at {at:?}");
    assert_eq!(cycle.state.query, "ste");
    assert!(!cycle.region_changed);
}

#[tokio::test(start_paused = true)]
async fn pause_longer_than_window_runs_two_cycles() {
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = InputCoordinator::new(FilterState::new("us"), Duration::from_millis(200));

    let typist = tokio::spawn(async move {
        tx.send(InputEvent::Query("alu".to_string())).unwrap();
        sleep(Duration::from_millis(250)).await;
        tx.send(InputEvent::Category(Some("Aluminum Poles".to_string())))
            .unwrap();
        sleep(Duration::from_millis(500)).await;
    });

    let mut cycles = Vec::new();
    coordinator::run(coordinator, rx, |cycle| {
        cycles.push(cycle);
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();
    typist.await.unwrap();

    assert_eq!(cycles.len(), 2);
    assert_eq!(cycles[0].state.query, "alu");
    assert_eq!(cycles[0].state.category, None);
    assert_eq!(cycles[1].state.query, "alu");
    assert_eq!(cycles[1].state.category.as_deref(), Some("Aluminum Poles"));
}

#[tokio::test(start_paused = true)]
async fn pending_burst_is_flushed_when_input_closes() {
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = InputCoordinator::new(FilterState::new("us"), Duration::from_millis(200));
    tx.send(InputEvent::Region("eu".to_string())).unwrap();
    tx.send(InputEvent::Query("conical".to_string())).unwrap();
    drop(tx);

    let mut cycles = Vec::new();
    let coordinator = coordinator::run(coordinator, rx, |cycle| {
        cycles.push(cycle);
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();

    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].region_changed);
    assert_eq!(cycles[0].state.region, "eu");
    assert_eq!(cycles[0].state.query, "conical");
    assert_eq!(coordinator.deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn failing_cycle_stops_the_loop() {
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = InputCoordinator::new(FilterState::new("us"), Duration::from_millis(200));

    let typist = tokio::spawn(async move {
        let _ = tx.send(InputEvent::Query("steel".to_string()));
        sleep(Duration::from_millis(250)).await;
        let _ = tx.send(InputEvent::Query("alu".to_string()));
        sleep(Duration::from_millis(500)).await;
    });

    let mut calls = 0;
    let result = coordinator::run(coordinator, rx, |_| {
        calls += 1;
        Err("stdout closed")
    })
    .await;
    typist.await.unwrap();

    assert_eq!(result.err(), Some("stdout closed"));
    assert_eq!(calls, 1);
}

#[test]
fn interactive_cycle_renders_highlighted_rows_once() {
    let catalog = shipped();
    let mut session = Session::new(&catalog, FilterState::new("eu"), Document::default());
    let writes = session.view().body_writes();

    let mut state = session.state().clone();
    state.set_query("conical");
    session.apply(FilterCycle {
        state,
        region_changed: false,
    });

    assert_eq!(session.view().body_writes(), writes + 1);
    assert_eq!(session.matches().len(), 3);
    assert!(session.view().body().contains("<mark>Conical</mark>"));
    assert!(session.view().body().contains("EU-SP-C-8000-4"));
}

#[test]
fn page_embeds_catalog_and_prerendered_rows() {
    let catalog = shipped();
    let mut state = FilterState::new("us");
    state.set_query("SP-RT");
    let page = String::from_utf8(crate::output::page::render_page(&catalog, &state, 200)).unwrap();
    assert!(page.contains("id=\"catalog-data\""));
    assert!(page.contains("SP-RT-25-188"));
    assert!(page.contains("2 OF 15 PRODUCTS"));
}
