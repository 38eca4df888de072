//! Virtual thermostat — a setpoint, a measured temperature and the action
//! the equipment takes to close the gap.

use heatsoak_domain::hvac::HvacAction;

/// Operating mode selected on the thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacMode {
    #[default]
    Heat,
    Off,
}

impl HvacMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualThermostat {
    pub hvac_mode: HvacMode,
    pub setpoint: f64,
    pub current_temperature: f64,
    pub hvac_action: HvacAction,
}

impl VirtualThermostat {
    /// A thermostat in heat mode, idle at `current_temperature`.
    #[must_use]
    pub fn heating_at(current_temperature: f64) -> Self {
        Self {
            hvac_mode: HvacMode::Heat,
            setpoint: current_temperature,
            current_temperature,
            hvac_action: HvacAction::Idle,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: HvacMode) -> Self {
        self.hvac_mode = mode;
        self.hvac_action = self.demanded_action();
        self
    }

    /// Change the setpoint and return the previous action when the
    /// equipment reacts to it.
    pub fn set_setpoint(&mut self, setpoint: f64) -> Option<HvacAction> {
        self.setpoint = setpoint;
        self.settle()
    }

    /// Change the measured temperature and return the previous action when
    /// the equipment reacts to it.
    pub fn set_current_temperature(&mut self, temperature: f64) -> Option<HvacAction> {
        self.current_temperature = temperature;
        self.settle()
    }

    /// Attribute lookup by the names a real climate entity exposes.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "hvac_action" => Some(self.hvac_action.to_string()),
            "hvac_mode" => Some(self.hvac_mode.as_str().to_string()),
            "temperature" => Some(self.setpoint.to_string()),
            "current_temperature" => Some(self.current_temperature.to_string()),
            _ => None,
        }
    }

    fn demanded_action(&self) -> HvacAction {
        match self.hvac_mode {
            HvacMode::Off => HvacAction::Off,
            HvacMode::Heat if self.setpoint > self.current_temperature => HvacAction::Heating,
            HvacMode::Heat => HvacAction::Idle,
        }
    }

    fn settle(&mut self) -> Option<HvacAction> {
        let next = self.demanded_action();
        if next == self.hvac_action {
            return None;
        }
        Some(std::mem::replace(&mut self.hvac_action, next))
    }
}
