use super::super::Shell;
use anyhow::Result;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{class, msg_send};
use std::ffi::CStr;

const ACTIVATION_POLICY_ACCESSORY: isize = 1;
const MODIFIER_FLAG_SHIFT: usize = 1 << 17;
const EVENT_MASK_ANY: usize = usize::MAX;
const TICK_SECONDS: f64 = 0.05;
const DEFAULT_RUN_LOOP_MODE: &CStr = c"kCFRunLoopDefaultMode";

/// Menu-bar only: no Dock icon, no main window.
pub fn init() -> Result<()> {
    unsafe {
        let app: Retained<AnyObject> = msg_send![class!(NSApplication), sharedApplication];
        let _: bool = msg_send![&app, setActivationPolicy: ACTIVATION_POLICY_ACCESSORY];
        let _: () = msg_send![&app, finishLaunching];
    }
    Ok(())
}

/// Pumps AppKit events on the main thread between shell ticks.
pub fn run(mut shell: Shell) {
    unsafe {
        let app: Retained<AnyObject> = msg_send![class!(NSApplication), sharedApplication];
        let mode: Retained<AnyObject> =
            msg_send![class!(NSString), stringWithUTF8String: DEFAULT_RUN_LOOP_MODE.as_ptr()];

        loop {
            let deadline: Retained<AnyObject> =
                msg_send![class!(NSDate), dateWithTimeIntervalSinceNow: TICK_SECONDS];
            let event: Option<Retained<AnyObject>> = msg_send![
                &app,
                nextEventMatchingMask: EVENT_MASK_ANY,
                untilDate: &*deadline,
                inMode: &*mode,
                dequeue: true
            ];
            if let Some(event) = event {
                let _: () = msg_send![&app, sendEvent: &*event];
            }

            if !shell.tick() {
                break;
            }
        }
    }
}

pub fn modifier_held() -> bool {
    let flags: usize = unsafe { msg_send![class!(NSEvent), modifierFlags] };
    flags & MODIFIER_FLAG_SHIFT != 0
}
