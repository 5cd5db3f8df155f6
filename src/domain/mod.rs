pub mod challenge;
pub mod geo;
pub mod observation;
pub mod species;

pub use challenge::{Challenge, ChallengeStandings, Invitation, ParticipantScore, PointsTable};
pub use geo::Feature;
pub use observation::{Observation, ObservationProperties};
pub use species::{ConservationStatus, RangeProperties, Species, SpeciesImage, SpeciesListing};
