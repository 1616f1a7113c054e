pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{NaiveDate, Utc};
use models::{
    chart::{ChartSeries, PairChart},
    period::TimePeriod,
    rate::{HistoryQuery, LatestRates, PairKey, RateSample},
    settings::Settings,
    watchlist::{PairForm, WatchlistState},
};
use providers::{http::HttpRatesBackend, traits::RatesBackend};
use services::{chart_service::ChartService, rate_client::RateCacheClient};
use std::sync::Arc;

use errors::CoreError;

/// Maximum custom chart range in days (10 years).
const MAX_CHART_RANGE_DAYS: i64 = 3650;

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The pair and its history are gone from the server.
    Deleted,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
}

/// Main entry point for the Rate Watch core library.
/// Holds the session state of the dashboard and the services it drives.
#[must_use]
pub struct RateWatch {
    client: RateCacheClient,
    chart_service: ChartService,
    watchlist: WatchlistState,
    pair_form: PairForm,
    period: TimePeriod,
    /// Last chart accepted for display.
    rendered_chart: Option<PairChart>,
    settings: Settings,
}

impl std::fmt::Debug for RateWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateWatch")
            .field("client", &self.client)
            .field("selected", &self.watchlist.selected_pair())
            .field("hidden", &self.watchlist.hidden_count())
            .field("period", &self.period)
            .field("settings", &self.settings)
            .finish()
    }
}

impl RateWatch {
    /// Connect to the REST API described by `settings`.
    /// Chart days are labelled in the machine's local offset.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let backend = HttpRatesBackend::from_settings(&settings)?;
        Ok(Self::with_backend(Arc::new(backend), settings)
            .with_chart_service(ChartService::local()))
    }

    /// Build on any backend implementation (used by tests and embedders).
    ///
    /// Chart days are labelled in UTC here so output does not depend on the
    /// host; call [`RateWatch::with_chart_service`] with
    /// [`ChartService::local`] for local labels.
    pub fn with_backend(backend: Arc<dyn RatesBackend>, settings: Settings) -> Self {
        Self {
            client: RateCacheClient::new(backend),
            chart_service: ChartService::new(),
            watchlist: WatchlistState::new(),
            pair_form: PairForm::new(),
            period: settings.default_period,
            rendered_chart: None,
            settings,
        }
    }

    /// Label chart days with `chart_service`.
    pub fn with_chart_service(mut self, chart_service: ChartService) -> Self {
        self.chart_service = chart_service;
        self
    }

    #[must_use]
    pub fn chart_service(&self) -> &ChartService {
        &self.chart_service
    }

    /// The shared caching client. Clones can be moved into spawned tasks.
    pub fn client(&self) -> &RateCacheClient {
        &self.client
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Latest rate of every tracked pair (cached).
    /// Selects the first pair when nothing is selected yet.
    pub async fn latest_rates(&mut self) -> Result<LatestRates, CoreError> {
        let latest = self.client.latest_rates().await?;
        if let Some(pair) = self.watchlist.select_first_if_none(&latest.rates) {
            tracing::debug!(%pair, "auto-selected first pair");
        }
        Ok(latest)
    }

    /// The watchlist rows to display, in server order.
    pub async fn visible_rates(&mut self) -> Result<Vec<RateSample>, CoreError> {
        let latest = self.latest_rates().await?;
        Ok(self
            .watchlist
            .visible_list(&latest.rates)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn select_pair(&mut self, base: &str, target: &str) -> Result<(), CoreError> {
        self.watchlist.select_pair(PairKey::parse(base, target)?);
        Ok(())
    }

    #[must_use]
    pub fn selected_pair(&self) -> Option<&PairKey> {
        self.watchlist.selected_pair()
    }

    /// Hide or unhide a pair. Returns whether it is now hidden.
    pub fn toggle_hidden(&mut self, base: &str, target: &str) -> Result<bool, CoreError> {
        Ok(self.watchlist.toggle_hidden(PairKey::parse(base, target)?))
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        self.watchlist.set_show_hidden(show);
    }

    #[must_use]
    pub fn watchlist(&self) -> &WatchlistState {
        &self.watchlist
    }

    /// Ask the server to pull fresh rates now.
    pub async fn refresh_rates(&self) -> Result<(), CoreError> {
        self.client.fetch_now().await
    }

    /// Delete a pair after the user confirms.
    ///
    /// `confirm` is asked first; declining sends nothing. On success the pair
    /// is dropped from the hidden set (and from the selection). On failure
    /// the session state is left untouched and the error is returned.
    pub async fn request_delete<F>(
        &mut self,
        base: &str,
        target: &str,
        confirm: F,
    ) -> Result<DeleteOutcome, CoreError>
    where
        F: FnOnce(&PairKey) -> bool,
    {
        let pair = PairKey::parse(base, target)?;
        if !confirm(&pair) {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.client.delete(&pair).await?;

        self.watchlist.forget_pair(&pair);
        if self.rendered_chart.as_ref().is_some_and(|c| c.pair == pair) {
            self.rendered_chart = None;
        }
        tracing::info!(%pair, "pair deleted");
        Ok(DeleteOutcome::Deleted)
    }

    // ── Add-pair form ───────────────────────────────────────────────

    #[must_use]
    pub fn pair_form(&self) -> &PairForm {
        &self.pair_form
    }

    pub fn pair_form_mut(&mut self) -> &mut PairForm {
        &mut self.pair_form
    }

    /// Submit the add-pair form.
    ///
    /// There is no "add" endpoint: a valid form triggers fetch-now so the
    /// server picks up the pair, then the form is cleared. A failed fetch
    /// keeps the form as typed.
    pub async fn submit_pair_form(&mut self) -> Result<PairKey, CoreError> {
        let pair = self.pair_form.pair()?;
        self.client.fetch_now().await?;
        self.pair_form.clear();
        tracing::info!(%pair, "pair submitted");
        Ok(pair)
    }

    // ── Charts ──────────────────────────────────────────────────────

    pub fn set_period(&mut self, period: TimePeriod) {
        self.period = period;
    }

    #[must_use]
    pub fn period(&self) -> TimePeriod {
        self.period
    }

    /// Bucket raw samples into a daily series.
    #[must_use]
    pub fn build_series(&self, samples: &[RateSample]) -> ChartSeries {
        self.chart_service.build_series(samples)
    }

    /// Fetch (or reuse) the history of `pair` for `period` ending on `today`
    /// and bucket it. Does not touch the rendered chart.
    pub async fn chart_for(
        &self,
        pair: &PairKey,
        period: TimePeriod,
        today: NaiveDate,
    ) -> Result<PairChart, CoreError> {
        let query = HistoryQuery::for_period(pair.clone(), period, today);
        let history = self.client.history_for(&query).await?;
        Ok(PairChart {
            pair: pair.clone(),
            period,
            series: self.chart_service.build_series(&history.samples()),
        })
    }

    /// Bucketed history of `pair` over an explicit date range.
    pub async fn chart_for_range(
        &self,
        pair: &PairKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ChartSeries, CoreError> {
        let range_days = (to - from).num_days();
        if range_days > MAX_CHART_RANGE_DAYS {
            return Err(CoreError::Validation(format!(
                "Chart range of {range_days} days exceeds maximum of {MAX_CHART_RANGE_DAYS} days (10 years)"
            )));
        }
        let query = HistoryQuery::new(pair.clone(), from, to)?;
        let history = self.client.history_for(&query).await?;
        Ok(self.chart_service.build_series(&history.samples()))
    }

    /// Accept a finished chart for display.
    ///
    /// A chart requested for a pair or period that is no longer selected is
    /// dropped, whatever order the responses arrived in. Returns whether the
    /// chart was accepted.
    pub fn apply_chart(&mut self, chart: PairChart) -> bool {
        let current = self.watchlist.is_selected(&chart.pair) && chart.period == self.period;
        if current {
            self.rendered_chart = Some(chart);
        } else {
            tracing::debug!(pair = %chart.pair, period = %chart.period, "dropping stale chart");
        }
        current
    }

    /// Load the chart for the current selection and period (today in UTC).
    /// Returns `None` when nothing is selected.
    pub async fn load_selected_chart(&mut self) -> Result<Option<&PairChart>, CoreError> {
        let Some(pair) = self.watchlist.selected_pair().cloned() else {
            return Ok(None);
        };
        let today = Utc::now().date_naive();
        let chart = self.chart_for(&pair, self.period, today).await?;
        self.apply_chart(chart);
        Ok(self.rendered_chart())
    }

    /// The displayed chart, if it still belongs to the current selection.
    #[must_use]
    pub fn rendered_chart(&self) -> Option<&PairChart> {
        self.rendered_chart
            .as_ref()
            .filter(|c| self.watchlist.is_selected(&c.pair) && c.period == self.period)
    }
}
