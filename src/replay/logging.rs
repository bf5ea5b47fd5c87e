use crate::ui::prelude::{Level, emit, is_debug_enabled};

/// Emits a replay event. Debug events are dropped unless `--debug` is on.
pub(super) fn log_event(level: Level, code: &str, message: impl Into<String>) {
    if matches!(level, Level::Debug) && !is_debug_enabled() {
        return;
    }
    let message = message.into();
    emit(level, code, &message, None);
}
