//! Smart-home state catalogue and the immutable `Event` record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised while constructing or parsing events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The state key is not part of the smart-home catalogue.
    #[error("unknown state key \"{0}\"")]
    UnknownStateKey(String),

    /// The state type is not part of the smart-home catalogue.
    #[error("unknown state type \"{0}\"")]
    UnknownStateType(String),

    /// The state type cannot describe the given state key.
    #[error("state key \"{key}\" cannot carry state type \"{state_type}\"")]
    StateTypeMismatch {
        /// Offending state key.
        key: StateKey,
        /// State type that was supplied for it.
        state_type: StateType,
    },

    /// The value is an integer where a boolean is expected, or vice versa.
    #[error("state key \"{key}\" expects {expected} values")]
    ValueKindMismatch {
        /// Offending state key.
        key: StateKey,
        /// Value kind the key requires.
        expected: ValueKind,
    },
}

/// Whether a piece of state holds integers or booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Boolean => f.write_str("boolean"),
        }
    }
}

/// Category of a tracked piece of smart-home state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateType {
    Temp,
    Door,
    Window,
    Light,
    BedroomTv,
    LivingRoomTv,
    Stove,
    Oven,
    Microwave,
    Refrigerator,
    DishWasher,
    Shower,
    Bath,
    BathExhaustFan,
    ClothesWasher,
    ClothesDryer,
}

impl StateType {
    /// Every state type in catalogue order.
    pub const ALL: [StateType; 16] = [
        Self::Temp,
        Self::Door,
        Self::Window,
        Self::Light,
        Self::BedroomTv,
        Self::LivingRoomTv,
        Self::Stove,
        Self::Oven,
        Self::Microwave,
        Self::Refrigerator,
        Self::DishWasher,
        Self::Shower,
        Self::Bath,
        Self::BathExhaustFan,
        Self::ClothesWasher,
        Self::ClothesDryer,
    ];

    /// Returns the camelCase name used in persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Door => "door",
            Self::Window => "window",
            Self::Light => "light",
            Self::BedroomTv => "bedroomTv",
            Self::LivingRoomTv => "livingRoomTv",
            Self::Stove => "stove",
            Self::Oven => "oven",
            Self::Microwave => "microwave",
            Self::Refrigerator => "refrigerator",
            Self::DishWasher => "dishWasher",
            Self::Shower => "shower",
            Self::Bath => "bath",
            Self::BathExhaustFan => "bathExhaustFan",
            Self::ClothesWasher => "clothesWasher",
            Self::ClothesDryer => "clothesDryer",
        }
    }

    /// Kind of value events of this type carry.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Temp => ValueKind::Integer,
            _ => ValueKind::Boolean,
        }
    }

    /// Labels for the `(false, true)` states, e.g. `("CLOSED", "OPEN")`.
    pub fn boolean_labels(self) -> (&'static str, &'static str) {
        match self {
            Self::Door | Self::Window => ("CLOSED", "OPEN"),
            _ => ("OFF", "ON"),
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EventError::UnknownStateType(s.to_string()))
    }
}

/// Unique identifier of a physical entity in the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateKey {
    OutdoorTemp,
    ThermostatTemp,
    Bedroom1OverheadLight,
    Bedroom1Lamp1,
    Bedroom1Lamp2,
    Bedroom1Window1,
    Bedroom1Window2,
    Bedroom1Tv,
    Bedroom2OverheadLight,
    Bedroom2Lamp1,
    Bedroom2Lamp2,
    Bedroom2Window1,
    Bedroom2Window2,
    Bedroom3OverheadLight,
    Bedroom3Lamp1,
    Bedroom3Lamp2,
    Bedroom3Window1,
    Bedroom3Window2,
    Bathroom1OverheadLight,
    Bathroom1ExhaustFan,
    Bathroom1Window,
    Bathroom1Faucet,
    Bathroom2OverheadLight,
    Bathroom2ExhaustFan,
    Bathroom2Window,
    Bathroom2Faucet,
    ClothesWasher,
    ClothesDryer,
    FrontDoor,
    BackDoor,
    GarageHouseDoor,
    GarageCarDoor1,
    GarageCarDoor2,
    LivingRoomOverheadLight,
    LivingRoomLamp1,
    LivingRoomLamp2,
    LivingRoomTv,
    LivingRoomWindow1,
    LivingRoomWindow2,
    LivingRoomWindow3,
    KitchenOverheadLight,
    KitchenStove,
    KitchenOven,
    KitchenMicrowave,
    KitchenRefrigerator,
    KitchenDishWasher,
    KitchenWindow1,
    KitchenWindow2,
}

impl StateKey {
    /// Every state key in catalogue order.
    pub const ALL: [StateKey; 48] = [
        Self::OutdoorTemp,
        Self::ThermostatTemp,
        Self::Bedroom1OverheadLight,
        Self::Bedroom1Lamp1,
        Self::Bedroom1Lamp2,
        Self::Bedroom1Window1,
        Self::Bedroom1Window2,
        Self::Bedroom1Tv,
        Self::Bedroom2OverheadLight,
        Self::Bedroom2Lamp1,
        Self::Bedroom2Lamp2,
        Self::Bedroom2Window1,
        Self::Bedroom2Window2,
        Self::Bedroom3OverheadLight,
        Self::Bedroom3Lamp1,
        Self::Bedroom3Lamp2,
        Self::Bedroom3Window1,
        Self::Bedroom3Window2,
        Self::Bathroom1OverheadLight,
        Self::Bathroom1ExhaustFan,
        Self::Bathroom1Window,
        Self::Bathroom1Faucet,
        Self::Bathroom2OverheadLight,
        Self::Bathroom2ExhaustFan,
        Self::Bathroom2Window,
        Self::Bathroom2Faucet,
        Self::ClothesWasher,
        Self::ClothesDryer,
        Self::FrontDoor,
        Self::BackDoor,
        Self::GarageHouseDoor,
        Self::GarageCarDoor1,
        Self::GarageCarDoor2,
        Self::LivingRoomOverheadLight,
        Self::LivingRoomLamp1,
        Self::LivingRoomLamp2,
        Self::LivingRoomTv,
        Self::LivingRoomWindow1,
        Self::LivingRoomWindow2,
        Self::LivingRoomWindow3,
        Self::KitchenOverheadLight,
        Self::KitchenStove,
        Self::KitchenOven,
        Self::KitchenMicrowave,
        Self::KitchenRefrigerator,
        Self::KitchenDishWasher,
        Self::KitchenWindow1,
        Self::KitchenWindow2,
    ];

    /// Returns the camelCase name used in persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutdoorTemp => "outdoorTemp",
            Self::ThermostatTemp => "thermostatTemp",
            Self::Bedroom1OverheadLight => "bedroom1OverheadLight",
            Self::Bedroom1Lamp1 => "bedroom1Lamp1",
            Self::Bedroom1Lamp2 => "bedroom1Lamp2",
            Self::Bedroom1Window1 => "bedroom1Window1",
            Self::Bedroom1Window2 => "bedroom1Window2",
            Self::Bedroom1Tv => "bedroom1Tv",
            Self::Bedroom2OverheadLight => "bedroom2OverheadLight",
            Self::Bedroom2Lamp1 => "bedroom2Lamp1",
            Self::Bedroom2Lamp2 => "bedroom2Lamp2",
            Self::Bedroom2Window1 => "bedroom2Window1",
            Self::Bedroom2Window2 => "bedroom2Window2",
            Self::Bedroom3OverheadLight => "bedroom3OverheadLight",
            Self::Bedroom3Lamp1 => "bedroom3Lamp1",
            Self::Bedroom3Lamp2 => "bedroom3Lamp2",
            Self::Bedroom3Window1 => "bedroom3Window1",
            Self::Bedroom3Window2 => "bedroom3Window2",
            Self::Bathroom1OverheadLight => "bathroom1OverheadLight",
            Self::Bathroom1ExhaustFan => "bathroom1ExhaustFan",
            Self::Bathroom1Window => "bathroom1Window",
            Self::Bathroom1Faucet => "bathroom1Faucet",
            Self::Bathroom2OverheadLight => "bathroom2OverheadLight",
            Self::Bathroom2ExhaustFan => "bathroom2ExhaustFan",
            Self::Bathroom2Window => "bathroom2Window",
            Self::Bathroom2Faucet => "bathroom2Faucet",
            Self::ClothesWasher => "clothesWasher",
            Self::ClothesDryer => "clothesDryer",
            Self::FrontDoor => "frontDoor",
            Self::BackDoor => "backDoor",
            Self::GarageHouseDoor => "garageHouseDoor",
            Self::GarageCarDoor1 => "garageCarDoor1",
            Self::GarageCarDoor2 => "garageCarDoor2",
            Self::LivingRoomOverheadLight => "livingRoomOverheadLight",
            Self::LivingRoomLamp1 => "livingRoomLamp1",
            Self::LivingRoomLamp2 => "livingRoomLamp2",
            Self::LivingRoomTv => "livingRoomTv",
            Self::LivingRoomWindow1 => "livingRoomWindow1",
            Self::LivingRoomWindow2 => "livingRoomWindow2",
            Self::LivingRoomWindow3 => "livingRoomWindow3",
            Self::KitchenOverheadLight => "kitchenOverheadLight",
            Self::KitchenStove => "kitchenStove",
            Self::KitchenOven => "kitchenOven",
            Self::KitchenMicrowave => "kitchenMicrowave",
            Self::KitchenRefrigerator => "kitchenRefrigerator",
            Self::KitchenDishWasher => "kitchenDishWasher",
            Self::KitchenWindow1 => "kitchenWindow1",
            Self::KitchenWindow2 => "kitchenWindow2",
        }
    }

    /// State type normally reported for this key.
    ///
    /// Faucets report `Shower` by default but also accept `Bath`
    /// (see [`StateKey::accepts`]).
    pub fn default_state_type(self) -> StateType {
        match self {
            Self::OutdoorTemp | Self::ThermostatTemp => StateType::Temp,
            Self::FrontDoor
            | Self::BackDoor
            | Self::GarageHouseDoor
            | Self::GarageCarDoor1
            | Self::GarageCarDoor2 => StateType::Door,
            Self::Bedroom1Window1
            | Self::Bedroom1Window2
            | Self::Bedroom2Window1
            | Self::Bedroom2Window2
            | Self::Bedroom3Window1
            | Self::Bedroom3Window2
            | Self::Bathroom1Window
            | Self::Bathroom2Window
            | Self::LivingRoomWindow1
            | Self::LivingRoomWindow2
            | Self::LivingRoomWindow3
            | Self::KitchenWindow1
            | Self::KitchenWindow2 => StateType::Window,
            Self::Bedroom1OverheadLight
            | Self::Bedroom1Lamp1
            | Self::Bedroom1Lamp2
            | Self::Bedroom2OverheadLight
            | Self::Bedroom2Lamp1
            | Self::Bedroom2Lamp2
            | Self::Bedroom3OverheadLight
            | Self::Bedroom3Lamp1
            | Self::Bedroom3Lamp2
            | Self::Bathroom1OverheadLight
            | Self::Bathroom2OverheadLight
            | Self::LivingRoomOverheadLight
            | Self::LivingRoomLamp1
            | Self::LivingRoomLamp2
            | Self::KitchenOverheadLight => StateType::Light,
            Self::Bedroom1Tv => StateType::BedroomTv,
            Self::LivingRoomTv => StateType::LivingRoomTv,
            Self::Bathroom1ExhaustFan | Self::Bathroom2ExhaustFan => StateType::BathExhaustFan,
            Self::Bathroom1Faucet | Self::Bathroom2Faucet => StateType::Shower,
            Self::ClothesWasher => StateType::ClothesWasher,
            Self::ClothesDryer => StateType::ClothesDryer,
            Self::KitchenStove => StateType::Stove,
            Self::KitchenOven => StateType::Oven,
            Self::KitchenMicrowave => StateType::Microwave,
            Self::KitchenRefrigerator => StateType::Refrigerator,
            Self::KitchenDishWasher => StateType::DishWasher,
        }
    }

    /// Returns `true` when events for this key may carry `state_type`.
    pub fn accepts(self, state_type: StateType) -> bool {
        match self {
            Self::Bathroom1Faucet | Self::Bathroom2Faucet => {
                matches!(state_type, StateType::Shower | StateType::Bath)
            }
            _ => self.default_state_type() == state_type,
        }
    }

    /// Kind of value this key holds.
    pub fn value_kind(self) -> ValueKind {
        self.default_state_type().value_kind()
    }

    /// Returns `true` for keys a user may change at runtime:
    /// doors, windows, lights and the thermostat.
    pub fn is_user_settable(self) -> bool {
        self == Self::ThermostatTemp
            || matches!(
                self.default_state_type(),
                StateType::Door | StateType::Window | StateType::Light
            )
    }

    /// Readable description of a new value, e.g. `"Front Door is OPEN"` or
    /// `"Thermostat Temp is 72"`.
    pub fn describe(self, value: EventValue) -> String {
        let name = self.human_readable();
        match value {
            EventValue::Integer(v) => format!("{name} is {v}"),
            EventValue::Boolean(on) => {
                let (off_label, on_label) = self.default_state_type().boolean_labels();
                format!("{name} is {}", if on { on_label } else { off_label })
            }
        }
    }

    /// Splits the camelCase key into words, e.g. `"Garage Car Door 1"`.
    pub fn human_readable(self) -> String {
        let mut out = String::new();
        for (i, c) in self.as_str().chars().enumerate() {
            if i == 0 {
                out.extend(c.to_uppercase());
                continue;
            }
            if c.is_uppercase() || c.is_ascii_digit() {
                out.push(' ');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateKey {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EventError::UnknownStateKey(s.to_string()))
    }
}

/// New value carried by an event: integer XOR boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Boolean(bool),
    Integer(i64),
}

impl EventValue {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
        }
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
        }
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Baseline history loaded once at startup.
    PreGenerated,
    /// Runtime override submitted by a client.
    UserGenerated,
}

/// Immutable smart-home state-change record.
///
/// Construction validates that the state type fits the key and that the
/// value kind matches, so every `Event` in the system is well formed.
///
/// # Examples
///
/// ```
/// use smart_home_sim::events::{Event, EventValue, StateKey};
///
/// let e = Event::boolean(10, StateKey::FrontDoor, true, "Front Door is OPEN").unwrap();
/// assert_eq!(e.time(), 10);
/// assert_eq!(e.new_value(), EventValue::Boolean(true));
/// assert!(Event::integer(10, StateKey::FrontDoor, 1, "bad").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    time: u64,
    state_type: StateType,
    state_key: StateKey,
    new_value: EventValue,
    message: String,
}

impl Event {
    /// Creates a validated event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::StateTypeMismatch`] when `state_type` cannot
    /// describe `state_key`, and [`EventError::ValueKindMismatch`] when the
    /// value is of the wrong kind for the key.
    pub fn new(
        time: u64,
        state_type: StateType,
        state_key: StateKey,
        new_value: EventValue,
        message: impl Into<String>,
    ) -> Result<Self, EventError> {
        if !state_key.accepts(state_type) {
            return Err(EventError::StateTypeMismatch {
                key: state_key,
                state_type,
            });
        }
        if new_value.kind() != state_key.value_kind() {
            return Err(EventError::ValueKindMismatch {
                key: state_key,
                expected: state_key.value_kind(),
            });
        }
        Ok(Self {
            time,
            state_type,
            state_key,
            new_value,
            message: message.into(),
        })
    }

    /// Creates an integer event using the key's default state type.
    ///
    /// # Errors
    ///
    /// See [`Event::new`].
    pub fn integer(
        time: u64,
        state_key: StateKey,
        value: i64,
        message: impl Into<String>,
    ) -> Result<Self, EventError> {
        Self::new(
            time,
            state_key.default_state_type(),
            state_key,
            EventValue::Integer(value),
            message,
        )
    }

    /// Creates a boolean event using the key's default state type.
    ///
    /// # Errors
    ///
    /// See [`Event::new`].
    pub fn boolean(
        time: u64,
        state_key: StateKey,
        value: bool,
        message: impl Into<String>,
    ) -> Result<Self, EventError> {
        Self::new(
            time,
            state_key.default_state_type(),
            state_key,
            EventValue::Boolean(value),
            message,
        )
    }

    /// Seconds since the simulation epoch.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    pub fn state_key(&self) -> StateKey {
        self.state_key
    }

    pub fn new_value(&self) -> EventValue {
        self.new_value
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the boolean value, or `None` for integer events.
    pub fn as_bool(&self) -> Option<bool> {
        match self.new_value {
            EventValue::Boolean(v) => Some(v),
            EventValue::Integer(_) => None,
        }
    }

    /// Returns the integer value, or `None` for boolean events.
    pub fn as_integer(&self) -> Option<i64> {
        match self.new_value {
            EventValue::Integer(v) => Some(v),
            EventValue::Boolean(_) => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.as_bool().is_some()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>7} {:<24} {:<14} {:>5} | {}",
            self.time, self.state_key, self.state_type, self.new_value, self.message
        )
    }
}
