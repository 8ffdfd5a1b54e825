/// Guard ensuring at most one idle registration is outstanding.
///
/// Armed when a registration is made, disarmed only when the resulting flush
/// starts. Arming an armed gate is a no-op.
#[derive(Debug, Default)]
pub struct IdleGate {
    armed: bool,
}

impl IdleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the gate. Returns `true` if it was not armed, meaning the caller
    /// must register with the idle detector.
    pub fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        true
    }

    /// Disarm the gate. Returns `true` if it was armed.
    pub fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
