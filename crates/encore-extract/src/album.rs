//! The album submission form.

use crate::error::ExtractionError;
use crate::form::{FormFields, FromFormFields};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An album as submitted by a client.
///
/// JSON bodies use camelCase keys (`albumArtUrl`), while HTML forms post the
/// art URL as `ArtUrl`. Both spellings are accepted at their own boundary only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumForm {
    /// Album title.
    pub title: String,
    /// Artist identifier.
    pub artist_id: i32,
    /// Genre identifier.
    pub genre_id: i32,
    /// Price, exact decimal.
    pub price: Decimal,
    /// Cover art URL.
    pub album_art_url: String,
}

/// Form keys posted by the album editor.
pub mod form_keys {
    /// Title field.
    pub const TITLE: &str = "Title";
    /// Artist id field.
    pub const ARTIST_ID: &str = "ArtistId";
    /// Genre id field.
    pub const GENRE_ID: &str = "GenreId";
    /// Price field.
    pub const PRICE: &str = "Price";
    /// Cover art URL field.
    pub const ART_URL: &str = "ArtUrl";
}

impl FromFormFields for AlbumForm {
    fn from_form_fields(fields: &FormFields) -> Result<Self, ExtractionError> {
        Ok(Self {
            title: fields.required(form_keys::TITLE)?.to_string(),
            artist_id: fields.required_i32(form_keys::ARTIST_ID)?,
            genre_id: fields.required_i32(form_keys::GENRE_ID)?,
            price: fields.required_decimal(form_keys::PRICE)?,
            album_art_url: fields.required(form_keys::ART_URL)?.to_string(),
        })
    }
}
