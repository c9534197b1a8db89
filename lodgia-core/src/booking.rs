use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Guest details submitted with a booking. Field renames match the wire
/// contract of the persistence endpoint, which mixes camelCase and
/// snake_case plus the `hotelID`/`destID` spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRequest {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "phoneNo")]
    pub phone_no: String,
    pub email: String,
    #[serde(rename = "special_req")]
    pub special_req: String,
    #[serde(rename = "hotelID")]
    pub hotel_id: String,
    #[serde(rename = "destID")]
    pub dest_id: String,
}

impl BookingRequest {
    /// Empty guest details bound to the stay the visitor navigated from.
    /// The hotel and destination ids are fixed here and never user-edited.
    pub fn for_stay(stay: &StayContext) -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            phone_no: String::new(),
            email: String::new(),
            special_req: String::new(),
            hotel_id: stay.hotel_id.clone(),
            dest_id: stay.destination_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestCounts {
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
}

/// Context carried over from the screen that routed here: which hotel,
/// which dates, how many guests. Assumed present; shape is not validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayContext {
    pub hotel_id: String,
    pub hotel_name: String,
    pub destination_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: GuestCounts,
}

impl StayContext {
    /// One-line description for the booking header / progress output.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} to {}), adults: {}, children: {}, rooms: {}",
            self.hotel_name,
            self.start_date,
            self.end_date,
            self.guests.adults,
            self.guests.children,
            self.guests.rooms
        )
    }
}
