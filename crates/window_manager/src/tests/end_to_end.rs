//! Owning-thread main loop: redraw routing, event delivery and closing

use std::sync::Arc;

use parking_lot::Mutex;

use super::support::{counted_window, manager, wait_until, RecordingHandler};
use crate::backend::HeadlessSystem;
use crate::config::ConfigError;
use crate::core::{GroupId, ManagerConfig, WaitPolicy, WindowId};
use crate::events::{Action, Event, EventHandler, EventKind, EventType, KeyCode, Modifiers, MouseButton};
use crate::window::{NativeHandle, WindowDescriptor, WindowError};
use crate::{ManagerError, ManagerHandle, WindowManager};

fn key_press() -> EventKind {
    EventKind::Key {
        key: KeyCode::SPACE,
        scancode: 0,
        action: Action::Press,
        mods: Modifiers::empty(),
    }
}

/// Cancels every close request it sees
struct CloseVeto {
    manager: ManagerHandle,
}

impl EventHandler for CloseVeto {
    fn event_types(&self) -> EventType {
        EventType::WINDOW_CLOSE
    }

    fn on_event(&self, event: &Event) -> bool {
        if let Some(window) = self.manager.window(event.window()) {
            window.set_should_close(false);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_redraw_draws_ungrouped_window_once() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");

        manager.handle().updates().set_to_update(GroupId::ALL, WindowId::ALL);
        assert!(manager.run_iteration());

        assert_eq!(drawable.count(), 1);
        let context = manager.system().context(window.native_handle()).unwrap();
        assert_eq!(context.swap_count(), 1);
        assert!(context.current_thread().is_none());
    }

    #[test]
    fn test_concurrent_group_draws_notified_window_once() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        assert!(manager.attach(group.id(), window.id()));
        group.run_concurrently().unwrap();

        manager.handle().notify(group.id(), window.id());
        manager.process_updates();

        assert!(wait_until(|| drawable.count() == 1));
        assert!(wait_until(|| group.pending_windows().is_empty()));
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(drawable.count(), 1);
    }

    #[test]
    fn test_destroying_group_stops_worker_and_ungroups() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();
        assert!(group.is_running_concurrently());

        assert!(manager.destroy_group(group.id()));

        assert!(!group.is_running_concurrently());
        assert!(group.is_empty());
        assert_eq!(manager.handle().group_of(window.id()), GroupId::NONE);
        assert!(manager.handle().group(group.id()).is_none());
    }

    #[test]
    fn test_close_event_destroys_window() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());

        manager.system().injector().push(window.native_handle(), EventKind::WindowClose);
        assert!(!manager.run_iteration());

        assert!(window.is_destroyed());
        assert!(manager.handle().window(window.id()).is_none());
        assert!(group.is_empty());
        assert_eq!(manager.system().surface_count(), 0);
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_handler_can_veto_close() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let veto = Arc::new(CloseVeto {
            manager: manager.handle().clone(),
        });
        window.bind_handler(veto, 0);

        manager.system().injector().push(window.native_handle(), EventKind::WindowClose);
        assert!(manager.run_iteration());

        assert!(!window.is_destroyed());
        assert!(!window.should_close());
        // Close requests never schedule a redraw
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_handlers_run_by_rank_until_consumed() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let log = Arc::new(Mutex::new(Vec::new()));
        window.bind_handler(RecordingHandler::new("consumer", EventType::KEY, true, &log), 2);
        window.bind_handler(RecordingHandler::new("observer", EventType::all(), false, &log), 1);
        window.bind_handler(RecordingHandler::new("late", EventType::KEY, false, &log), 3);

        manager.system().injector().push(window.native_handle(), key_press());
        manager.run_iteration();

        assert_eq!(*log.lock(), ["observer", "consumer"]);
    }

    #[test]
    fn test_handlers_only_see_declared_types() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let log = Arc::new(Mutex::new(Vec::new()));
        window.bind_handler(RecordingHandler::new("mouse", EventType::MOUSE_BUTTON, false, &log), 0);

        let injector = manager.system().injector();
        injector.push(window.native_handle(), key_press());
        injector.push(
            window.native_handle(),
            EventKind::MouseButton {
                button: MouseButton::Left,
                action: Action::Press,
                mods: Modifiers::SHIFT,
            },
        );
        manager.run_iteration();

        assert_eq!(*log.lock(), ["mouse"]);
    }

    #[test]
    fn test_unbound_handler_is_not_called() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<dyn EventHandler> = RecordingHandler::new("gone", EventType::all(), false, &log);
        window.bind_handler(Arc::clone(&handler), 0);
        assert!(window.unbind_handler(&handler));

        manager.system().injector().push(window.native_handle(), EventKind::WindowRefresh);
        manager.run_iteration();

        assert!(log.lock().is_empty());
        assert_eq!(window.handler_count(), 0);
    }

    #[test]
    fn test_event_schedules_redraw_for_next_iteration() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");

        manager.system().injector().push(window.native_handle(), EventKind::WindowRefresh);
        manager.run_iteration();
        assert_eq!(drawable.count(), 0);
        assert!(!manager.handle().updates().is_empty());

        manager.run_iteration();
        assert_eq!(drawable.count(), 1);
    }

    #[test]
    fn test_event_for_concurrent_group_goes_to_worker() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();

        manager.system().injector().push(window.native_handle(), EventKind::WindowRefresh);
        manager.run_iteration();

        assert!(wait_until(|| drawable.count() == 1));
        assert!(manager.handle().updates().is_empty());
        assert_eq!(drawable.thread_names(), [Some(format!("window-group-{}", group.id()))]);
    }

    #[test]
    fn test_unregistered_native_window_is_discarded() {
        let mut manager = manager();
        let (_window, drawable) = counted_window(&mut manager, "A");

        manager.system().injector().push(NativeHandle(999), EventKind::WindowClose);
        assert!(manager.run_iteration());

        assert!(manager.handle().updates().is_empty());
        assert_eq!(drawable.count(), 0);
    }

    #[test]
    fn test_failed_creation_leaves_no_trace() {
        let mut manager = manager();
        manager.system_mut().refuse_creation(true);

        let result = manager.create_window(&WindowDescriptor::new(10, 10, "nope"), None);
        assert!(matches!(result, Err(ManagerError::Window(WindowError::CreationFailed(_)))));
        assert!(manager.handle().windows().is_empty());
        assert_eq!(manager.handle().windows().mutexes().live_slots(), 0);

        manager.system_mut().refuse_creation(false);
        let (window, _drawable) = counted_window(&mut manager, "A");
        assert_eq!(window.id(), WindowId::new(0));
    }

    #[test]
    fn test_shared_context_windows_share_a_lock() {
        let mut manager = manager();
        let (first, _drawable) = counted_window(&mut manager, "A");
        let second = manager
            .create_window(&WindowDescriptor::new(10, 10, "B"), Some(first.id()))
            .unwrap();

        assert!(first.shared_mutex().same_lock(second.shared_mutex()));
        let context = manager.system().context(second.native_handle()).unwrap();
        assert_eq!(context.shared_with(), Some(first.native_handle()));
    }

    #[test]
    fn test_poll_mode_redraws_every_iteration() {
        let mut manager = manager();
        let (_window, drawable) = counted_window(&mut manager, "A");
        manager.handle().set_poll(true);
        assert!(manager.handle().is_polling());
        assert_eq!(manager.system().wake_count(), 1);

        for _ in 0..3 {
            manager.run_iteration();
        }
        assert_eq!(drawable.count(), 3);
    }

    #[test]
    fn test_notify_from_other_thread_wakes_blocking_wait() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        manager.handle().set_poll(false);

        let handle = manager.handle().clone();
        let id = window.id();
        let poster = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            handle.notify(GroupId::ANY, id);
        });

        // Blocks until the notification arrives, then draws on the next drain
        manager.run_iteration();
        poster.join().unwrap();
        manager.handle().set_wait_timeout(0.001);
        manager.run_iteration();
        assert_eq!(drawable.count(), 1);
    }

    #[test]
    fn test_main_loop_exits_when_every_window_closed() {
        let mut manager = manager();
        let (a, drawable_a) = counted_window(&mut manager, "A");
        let (b, drawable_b) = counted_window(&mut manager, "B");
        let injector = manager.system().injector();
        injector.push(a.native_handle(), EventKind::WindowClose);
        injector.push(b.native_handle(), EventKind::WindowClose);

        manager.main_loop();

        assert_eq!((drawable_a.count(), drawable_b.count()), (1, 1));
        assert!(manager.handle().windows().is_empty());
    }

    #[test]
    fn test_main_loop_without_windows_returns() {
        let mut manager = manager();
        manager.handle().set_poll(false);
        manager.main_loop();
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_closed_window_id_is_reused() {
        let mut manager = manager();
        let (a, _) = counted_window(&mut manager, "A");
        let (b, _) = counted_window(&mut manager, "B");
        a.set_should_close(true);
        manager.close_windows();

        let (c, _) = counted_window(&mut manager, "C");
        assert_eq!(c.id(), a.id());
        assert_ne!(c.id(), b.id());
    }

    #[test]
    fn test_surface_operations_by_id() {
        let mut manager = manager();
        let (window, _drawable) = counted_window(&mut manager, "A");
        let id = window.id();

        manager.set_window_title(id, "Renamed").unwrap();
        manager.set_window_size(id, 320, 240).unwrap();
        manager.set_window_position(id, 5, 6).unwrap();
        manager.set_window_visible(id, false).unwrap();
        manager.iconify_window(id).unwrap();
        manager.set_clipboard(id, "copied").unwrap();

        let handle = window.native_handle();
        assert_eq!(manager.system().title(handle), Some("Renamed"));
        assert_eq!(manager.window_size(id).unwrap(), (320, 240));
        assert_eq!(manager.window_position(id).unwrap(), (5, 6));
        assert_eq!(manager.system().is_visible(handle), Some(false));
        assert_eq!(manager.system().is_iconified(handle), Some(true));
        assert_eq!(manager.clipboard(id).unwrap().as_deref(), Some("copied"));

        let missing = WindowId::new(42);
        assert!(matches!(
            manager.set_window_title(missing, "x"),
            Err(ManagerError::UnknownWindow(id)) if id == missing
        ));
    }

    #[test]
    fn test_config_swap_interval_applied_to_new_windows() {
        let config = ManagerConfig {
            swap_interval: Some(1),
            ..Default::default()
        };
        let mut manager = WindowManager::with_config(HeadlessSystem::new(), config).unwrap();
        let window = manager.create_default_window().unwrap();

        assert_eq!(manager.system().swap_interval(), Some(1));
        assert_eq!(manager.system().title(window.native_handle()), Some("Window"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ManagerConfig::default();
        config.window.width = 0;
        let result = WindowManager::with_config(HeadlessSystem::new(), config);
        assert!(matches!(result, Err(ManagerError::Config(_))));
    }

    #[test]
    fn test_config_log_filter_applied_or_rejected() {
        let blank = ManagerConfig {
            log_filter: Some("  ".to_string()),
            ..Default::default()
        };
        let result = WindowManager::with_config(HeadlessSystem::new(), blank);
        assert!(matches!(
            result,
            Err(ManagerError::Config(ConfigError::Invalid { field: "log_filter", .. }))
        ));

        let config = ManagerConfig {
            log_filter: Some("window_manager=debug".to_string()),
            ..Default::default()
        };
        let manager = WindowManager::with_config(HeadlessSystem::new(), config).unwrap();
        assert_eq!(manager.config().log_filter.as_deref(), Some("window_manager=debug"));
        // Either the filter was installed just now or an earlier logger stays
        let metadata = log::Metadata::builder()
            .level(log::Level::Error)
            .target("window_manager")
            .build();
        assert!(log::logger().enabled(&metadata));
    }

    #[test]
    fn test_unrepresentable_wait_timeout_does_not_panic() {
        let config = ManagerConfig {
            wait_policy: WaitPolicy::Timeout(1e20),
            ..Default::default()
        };
        let mut manager = WindowManager::with_config(HeadlessSystem::new(), config).unwrap();
        let (_window, drawable) = counted_window(&mut manager, "A");

        manager.handle().notify(GroupId::ALL, WindowId::ALL);
        assert!(manager.run_iteration());
        assert_eq!(drawable.count(), 1);
    }

    #[test]
    fn test_terminate_tears_everything_down() {
        let mut manager = manager();
        let (a, _) = counted_window(&mut manager, "A");
        let (_b, _) = counted_window(&mut manager, "B");
        let group = manager.create_group();
        manager.attach(group.id(), a.id());
        group.run_concurrently().unwrap();

        manager.terminate();

        assert!(!group.is_running_concurrently());
        assert!(manager.handle().groups().is_empty());
        assert!(manager.handle().windows().is_empty());
        assert_eq!(manager.system().surface_count(), 0);
        manager.terminate();
    }
}
