//! Group render loops: inline passes, worker threads and forwarding

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::support::{counted_window, manager, wait_until, CountingDrawable};
use crate::core::{GroupId, WindowId};
use crate::update_queue::UpdateRequest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_pass_draws_only_pending_members() {
        let mut manager = manager();
        let (w1, d1) = counted_window(&mut manager, "1");
        let (w2, d2) = counted_window(&mut manager, "2");
        let group = manager.create_group();
        manager.attach(group.id(), w1.id());
        manager.attach(group.id(), w2.id());

        group.set_window_to_update(w2.id());
        group.process();

        assert_eq!((d1.count(), d2.count()), (0, 1));
        assert!(group.pending_windows().is_empty());
        assert_eq!(d2.thread_names(), [thread::current().name().map(String::from)]);
    }

    #[test]
    fn test_polling_group_draws_every_member() {
        let mut manager = manager();
        let (w1, d1) = counted_window(&mut manager, "1");
        let (w2, d2) = counted_window(&mut manager, "2");
        let group = manager.create_group();
        manager.attach(group.id(), w1.id());
        manager.attach(group.id(), w2.id());

        group.set_poll(true);
        group.process();

        assert_eq!((d1.count(), d2.count()), (1, 1));
    }

    #[test]
    fn test_whole_group_sentinel_draws_every_member() {
        let mut manager = manager();
        let (w1, d1) = counted_window(&mut manager, "1");
        let (w2, d2) = counted_window(&mut manager, "2");
        let (_outsider, d3) = counted_window(&mut manager, "3");
        let group = manager.create_group();
        manager.attach(group.id(), w1.id());
        manager.attach(group.id(), w2.id());

        group.set_window_to_update(WindowId::WHOLE_GROUP);
        group.process();

        assert_eq!((d1.count(), d2.count(), d3.count()), (1, 1, 0));
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_pending_outsider_is_forwarded_then_drawn() {
        let mut manager = manager();
        let (member, d_member) = counted_window(&mut manager, "member");
        let (outsider, d_outsider) = counted_window(&mut manager, "outsider");
        let group = manager.create_group();
        manager.attach(group.id(), member.id());

        group.set_window_to_update(outsider.id());
        group.process();

        assert_eq!((d_member.count(), d_outsider.count()), (0, 0));
        assert_eq!(
            manager.handle().updates().pop(),
            Some(UpdateRequest {
                group: GroupId::ANY,
                windows: HashSet::from([outsider.id()]),
            })
        );

        manager.handle().notify(GroupId::ANY, outsider.id());
        manager.process_updates();
        assert_eq!(d_outsider.count(), 1);
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_redirect_reaches_window_moved_to_another_group() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let old = manager.create_group();
        let new = manager.create_group();
        manager.attach(old.id(), window.id());

        // Marked under the old group, then moved before the pass runs
        old.set_window_to_update(window.id());
        manager.attach(new.id(), window.id());
        old.process();
        assert_eq!(drawable.count(), 0);

        manager.process_updates();
        assert_eq!(drawable.count(), 1);
        assert!(new.pending_windows().is_empty());
    }

    #[test]
    fn test_everything_request_reaches_groups_and_ungrouped_windows() {
        let mut manager = manager();
        let (grouped, d_grouped) = counted_window(&mut manager, "grouped");
        let (_loose, d_loose) = counted_window(&mut manager, "loose");
        let group = manager.create_group();
        manager.attach(group.id(), grouped.id());

        let updates = manager.handle().updates();
        updates.set_to_update(group.id(), grouped.id());
        updates.set_to_update(GroupId::ANY, WindowId::ALL);
        manager.process_updates();

        assert_eq!((d_grouped.count(), d_loose.count()), (1, 1));
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_worker_thread_draws_and_is_named() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();
        // Starting twice keeps the single worker
        group.run_concurrently().unwrap();

        group.set_window_to_update(window.id());
        group.process();

        assert!(wait_until(|| drawable.count() == 1));
        let expected = Some(format!("window-group-{}", group.id()));
        assert_eq!(drawable.thread_names(), [expected]);
    }

    #[test]
    fn test_stopped_group_draws_inline() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();
        group.stop_and_join();
        assert!(!group.is_running_concurrently());

        group.set_window_to_update(window.id());
        group.process();

        assert_eq!(drawable.count(), 1);
        assert_eq!(drawable.thread_names(), [thread::current().name().map(String::from)]);
    }

    #[test]
    fn test_stop_and_join_without_worker_returns() {
        let mut manager = manager();
        let group = manager.create_group();

        let start = std::time::Instant::now();
        group.stop_and_join();
        group.stop_and_join();

        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(!group.is_running_concurrently());
    }

    #[test]
    fn test_group_can_restart_after_stop() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());

        group.run_concurrently().unwrap();
        group.stop();
        group.run_concurrently().unwrap();
        assert!(group.is_running_concurrently());

        group.set_window_to_update(window.id());
        group.process();
        assert!(wait_until(|| drawable.count() == 1));
    }

    #[test]
    fn test_concurrent_polling_group_keeps_drawing() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();

        group.set_poll(true);
        assert!(wait_until(|| drawable.count() >= 3));

        group.set_poll(false);
        manager.destroy_group(group.id());
        let settled = drawable.count();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(drawable.count(), settled);
    }

    #[test]
    fn test_window_lock_blocks_worker_draw() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();

        let guard = window.lock();
        group.set_window_to_update(window.id());
        group.process();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(drawable.count(), 0);

        drop(guard);
        assert!(wait_until(|| drawable.count() == 1));
    }

    #[test]
    fn test_destroy_waits_for_draw_in_progress() {
        let mut manager = manager();
        let window = manager
            .create_window(&crate::window::WindowDescriptor::new(64, 64, "slow"), None)
            .unwrap();
        let drawable = CountingDrawable::slow(Duration::from_millis(50));
        window.bind_drawable(drawable.clone(), 0);
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();

        group.set_window_to_update(window.id());
        group.process();
        assert!(wait_until(|| drawable.started() == 1));

        assert!(manager.destroy_window(window.id()));
        // The draw in progress finished before the surface went away
        assert_eq!(drawable.count(), 1);
        assert!(window.is_destroyed());
        assert_eq!(manager.system().surface_count(), 0);
    }

    #[test]
    fn test_closing_window_may_draw_until_swept() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());

        window.set_should_close(true);
        group.set_window_to_update(window.id());
        group.process();
        assert_eq!(drawable.count(), 1);

        manager.close_windows();
        group.set_window_to_update(window.id());
        group.process();
        manager.process_updates();
        assert_eq!(drawable.count(), 1);
        assert!(manager.handle().updates().is_empty());
    }

    #[test]
    fn test_notifications_from_many_threads() {
        let mut manager = manager();
        let (window, drawable) = counted_window(&mut manager, "A");
        let group = manager.create_group();
        manager.attach(group.id(), window.id());
        group.run_concurrently().unwrap();

        let posters: Vec<_> = (0..4)
            .map(|_| {
                let group = Arc::clone(&group);
                let id = window.id();
                thread::spawn(move || {
                    for _ in 0..25 {
                        group.set_window_to_update(id);
                        group.process();
                    }
                })
            })
            .collect();
        for poster in posters {
            poster.join().unwrap();
        }

        assert!(wait_until(|| group.pending_windows().is_empty() && drawable.count() >= 1));
        let settled = drawable.count();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(drawable.count(), settled);
        assert!(settled <= 100);
    }
}
