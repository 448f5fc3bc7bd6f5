//! Interaction controller: turns user actions into geocode → forecast →
//! render sequences and is the only place provider errors are caught.

use crate::config::RuntimeConfig;
use crate::display::{DisplaySurface, StatusLine};
use crate::model::{ForecastPayload, Location, normalize_query};
use crate::providers::{ProviderApi, ProviderError};
use crate::render;
use crate::units::UnitPreference;

/// Handle for one in-flight search. Completing a ticket older than the
/// most recently issued one is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    units: UnitPreference,
}

impl SearchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }

    pub fn units(self) -> UnitPreference {
        self.units
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nothing to do: blank query, or a unit change with nothing displayed.
    Ignored,
    Rendered(Location),
    Failed(ProviderError),
    /// A newer search was started before this one completed.
    Stale,
}

#[derive(Debug)]
pub struct Controller<P, S> {
    providers: P,
    surface: S,
    units: UnitPreference,
    input: String,
    default_place: String,
    latest_generation: u64,
}

impl<P, S> Controller<P, S>
where
    P: ProviderApi,
    S: DisplaySurface,
{
    pub fn new(providers: P, surface: S, config: &RuntimeConfig) -> Self {
        Self {
            providers,
            surface,
            units: config.units,
            input: String::new(),
            default_place: config.default_place.clone(),
            latest_generation: 0,
        }
    }

    pub fn units(&self) -> UnitPreference {
        self.units
    }

    /// Query text currently held in the search input.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn providers(&self) -> &P {
        &self.providers
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Searches the configured default place so the widget never starts
    /// empty.
    pub fn initial_load(&mut self) -> SearchOutcome {
        let place = self.default_place.clone();
        self.submit(&place)
    }

    pub fn submit(&mut self, raw_query: &str) -> SearchOutcome {
        let Ok(query) = normalize_query(raw_query) else {
            return SearchOutcome::Ignored;
        };
        self.input = query.clone();

        let ticket = self.begin();
        let result = self.lookup(ticket, &query);
        self.complete(ticket, result)
    }

    /// Stores the new preference and re-runs the current query when a
    /// location is already on screen.
    pub fn set_units(&mut self, units: UnitPreference) -> SearchOutcome {
        self.units = units;
        if self.surface.displayed_location().is_none() {
            return SearchOutcome::Ignored;
        }

        let query = self.input.clone();
        self.submit(&query)
    }

    /// Starts a search: bumps the generation and shows the loading status.
    pub fn begin(&mut self) -> SearchTicket {
        self.latest_generation += 1;
        self.surface.set_status(StatusLine::loading());
        SearchTicket {
            generation: self.latest_generation,
            units: self.units,
        }
    }

    pub fn lookup(
        &self,
        ticket: SearchTicket,
        query: &str,
    ) -> Result<(Location, ForecastPayload), ProviderError> {
        let location = self.providers.geocode(query)?;
        tracing::debug!(
            generation = ticket.generation,
            name = %location.name,
            lat = location.latitude,
            lon = location.longitude,
            "resolved location"
        );
        let payload =
            self.providers
                .fetch_forecast(location.latitude, location.longitude, ticket.units)?;
        Ok((location, payload))
    }

    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        result: Result<(Location, ForecastPayload), ProviderError>,
    ) -> SearchOutcome {
        if ticket.generation < self.latest_generation {
            tracing::warn!(
                generation = ticket.generation,
                latest = self.latest_generation,
                "dropping stale search result"
            );
            return SearchOutcome::Stale;
        }

        let outcome = match result {
            Ok((location, payload)) => {
                let rendered = render::render(&payload, &location, ticket.units);
                render::paint(&mut self.surface, rendered);
                tracing::info!(
                    name = %location.name,
                    units = ticket.units.as_str(),
                    hours = payload.hourly.len(),
                    days = payload.daily.len(),
                    "rendered forecast"
                );
                SearchOutcome::Rendered(location)
            }
            Err(error) => {
                tracing::info!(code = error.code(), %error, "search failed");
                self.surface.set_status(StatusLine::error(error.to_string()));
                SearchOutcome::Failed(error)
            }
        };

        self.surface.commit();
        outcome
    }
}
