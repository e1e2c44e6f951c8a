use super::super::Shell;
use anyhow::Result;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

pub fn init() -> Result<()> {
    Ok(())
}

pub fn run(mut shell: Shell) {
    while shell.tick() {
        std::thread::sleep(TICK);
    }
}

pub fn modifier_held() -> bool {
    false
}
