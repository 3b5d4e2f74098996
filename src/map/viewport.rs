// Camera policy after the filtered list changes, as an explicit decision table:
//
//   applied query | results | exact name match | rule           | camera          | selection
//   --------------+---------+------------------+----------------+-----------------+----------------
//   empty         | 0       | -                | OverviewEmpty  | keep            | clear
//   empty         | >= 1    | -                | Overview       | fit (overview)  | clear
//   non-empty     | 0       | -                | NoResults      | keep            | clear
//   non-empty     | 1       | -                | SingleResult   | fly (search)    | that result
//   non-empty     | >= 2    | yes              | ExactMatch     | fly (search)    | the match
//   non-empty     | >= 2    | no               | SearchOverview | fit (search)    | keep if visible
use serde::{Deserialize, Serialize};

use super::surface::{BoundsFit, Flight};
use crate::filter::exact_name_match;
use crate::model::{Product, ProductId};
use crate::position::padded_bounds;

/// Zoom levels, durations (seconds) and padding ratios for every camera move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPolicy {
    pub marker_zoom: f64,
    pub marker_duration: f64,
    pub search_zoom: f64,
    pub search_duration: f64,
    pub locate_zoom: f64,
    pub locate_duration: f64,
    pub overview_padding: f64,
    pub overview_duration: f64,
    pub search_padding: f64,
    pub search_fit_duration: f64,
}

impl Default for CameraPolicy {
    fn default() -> Self {
        Self {
            marker_zoom: 15.0,
            marker_duration: 1.5,
            search_zoom: 14.0,
            search_duration: 2.0,
            locate_zoom: 13.0,
            locate_duration: 2.0,
            overview_padding: 0.1,
            overview_duration: 1.0,
            search_padding: 0.3,
            search_fit_duration: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// No query and nothing to show
    OverviewEmpty,
    Overview,
    /// The query matched nothing; the camera stays where it is
    NoResults,
    /// Index into the result list
    SingleResult(usize),
    ExactMatch(usize),
    SearchOverview,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    Keep,
    FitBounds(BoundsFit),
    FlyTo(Flight),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEffect {
    Clear,
    Select(ProductId),
    RetainIfVisible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportDecision {
    pub rule: Rule,
    pub camera: CameraAction,
    pub selection: SelectionEffect,
}

pub fn classify(applied_query: &str, results: &[Product]) -> Rule {
    let query = applied_query.trim();
    if query.is_empty() {
        return if results.is_empty() { Rule::OverviewEmpty } else { Rule::Overview };
    }
    match results.len() {
        0 => Rule::NoResults,
        1 => Rule::SingleResult(0),
        _ => match exact_name_match(results, query) {
            Some(hit) => {
                let idx = results.iter().position(|p| p.id == hit.id).unwrap_or(0);
                Rule::ExactMatch(idx)
            }
            None => Rule::SearchOverview,
        },
    }
}

pub fn decide(applied_query: &str, results: &[Product], policy: &CameraPolicy) -> ViewportDecision {
    let rule = classify(applied_query, results);
    let fit = |pad: f64, duration: f64| {
        let points: Vec<_> = results.iter().map(|p| p.point()).collect();
        match padded_bounds(&points, pad) {
            Some(bounds) => CameraAction::FitBounds(BoundsFit { bounds, duration }),
            None => CameraAction::Keep,
        }
    };
    let fly = |idx: usize| {
        let p = &results[idx];
        (
            CameraAction::FlyTo(Flight {
                target: p.point(),
                zoom: policy.search_zoom,
                duration: policy.search_duration,
            }),
            SelectionEffect::Select(p.id.clone()),
        )
    };

    let (camera, selection) = match rule {
        Rule::OverviewEmpty | Rule::NoResults => (CameraAction::Keep, SelectionEffect::Clear),
        Rule::Overview => {
            (fit(policy.overview_padding, policy.overview_duration), SelectionEffect::Clear)
        }
        Rule::SingleResult(idx) | Rule::ExactMatch(idx) => fly(idx),
        Rule::SearchOverview => {
            (fit(policy.search_padding, policy.search_fit_duration), SelectionEffect::RetainIfVisible)
        }
    };
    ViewportDecision { rule, camera, selection }
}
