//! GLFW windowing system
//!
//! Native windows, OpenGL contexts and the platform event queue, through the
//! `glfw` crate. GLFW must be driven from the thread that initialized it,
//! which is why [`GlfwSystem`] is owned by the window manager on the owning
//! thread. Contexts and the waker are the only pieces handed to other threads.

use std::collections::HashMap;
use std::sync::Arc;

use glfw::{Context, Glfw, GlfwReceiver, PWindow, WindowEvent, WindowMode};
use log::{error, info};
use parking_lot::Mutex;

use crate::core::ClientApi;
use crate::events::{Action, CursorMode, EventKind, EventType, InputMode, KeyCode, Modifiers, MouseButton};
use crate::window::{
    EventWaker, Monitor, NativeHandle, RenderContext, Surface, SystemEvent, WindowDescriptor, WindowError, WindowResult,
    WindowSystem,
};

fn log_glfw_error(error: glfw::Error, description: String) {
    error!("GLFW error {error:?}: {description}");
}

struct NativeWindow {
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

struct GlfwContext {
    context: Mutex<glfw::PRenderContext>,
}

impl RenderContext for GlfwContext {
    fn make_current(&self) {
        self.context.lock().make_current();
    }

    fn release_current(&self) {
        glfw::make_context_current(None);
    }

    fn swap_buffers(&self) {
        self.context.lock().swap_buffers();
    }
}

struct GlfwWaker;

impl EventWaker for GlfwWaker {
    #[allow(unsafe_code)]
    fn wake(&self) {
        // SAFETY: glfwPostEmptyEvent may be called from any thread once GLFW
        // is initialized, and a waker only exists after `GlfwSystem::init`.
        // `Glfw::post_empty_event` cannot be used here since `Glfw` is not `Send`.
        unsafe { glfw::ffi::glfwPostEmptyEvent() };
    }
}

/// GLFW-backed windowing system
pub struct GlfwSystem {
    glfw: Glfw,
    windows: HashMap<NativeHandle, NativeWindow>,
    next_handle: u64,
}

impl GlfwSystem {
    /// Initialize GLFW on the calling thread
    pub fn init() -> WindowResult<Self> {
        let glfw = glfw::init(log_glfw_error).map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;
        info!("GLFW {} initialized", glfw::get_version_string());
        Ok(Self {
            glfw,
            windows: HashMap::new(),
            next_handle: 1,
        })
    }

    fn window(&self, handle: NativeHandle) -> WindowResult<&PWindow> {
        self.windows
            .get(&handle)
            .map(|native| &native.window)
            .ok_or(WindowError::UnknownWindow(handle))
    }

    fn window_mut(&mut self, handle: NativeHandle) -> WindowResult<&mut PWindow> {
        self.windows
            .get_mut(&handle)
            .map(|native| &mut native.window)
            .ok_or(WindowError::UnknownWindow(handle))
    }

    fn apply_hints(&mut self, descriptor: &WindowDescriptor) {
        let api = match descriptor.client_api {
            ClientApi::OpenGl => glfw::ClientApiHint::OpenGl,
            ClientApi::OpenGlEs => glfw::ClientApiHint::OpenGlEs,
            ClientApi::NoApi => glfw::ClientApiHint::NoApi,
        };
        self.glfw.window_hint(glfw::WindowHint::ClientApi(api));
        self.glfw.window_hint(glfw::WindowHint::Resizable(descriptor.resizable));
        self.glfw.window_hint(glfw::WindowHint::Visible(descriptor.visible));
    }

    fn collect_events(&self) -> Vec<SystemEvent> {
        let mut collected = Vec::new();
        for (handle, native) in &self.windows {
            for (_, event) in glfw::flush_messages(&native.events) {
                if let Some(kind) = translate_event(event) {
                    collected.push(SystemEvent { handle: *handle, kind });
                }
            }
        }
        collected
    }
}

fn open_window(
    glfw: &mut Glfw,
    share: Option<&PWindow>,
    descriptor: &WindowDescriptor,
    mode: WindowMode<'_>,
) -> Option<(PWindow, GlfwReceiver<(f64, WindowEvent)>)> {
    match share {
        Some(window) => window.create_shared(descriptor.width, descriptor.height, &descriptor.title, mode),
        None => glfw.create_window(descriptor.width, descriptor.height, &descriptor.title, mode),
    }
}

fn enable_polling(window: &mut PWindow, types: EventType) {
    window.set_pos_polling(types.contains(EventType::WINDOW_POSITION));
    window.set_size_polling(types.contains(EventType::WINDOW_SIZE));
    window.set_close_polling(types.contains(EventType::WINDOW_CLOSE));
    window.set_refresh_polling(types.contains(EventType::WINDOW_REFRESH));
    window.set_focus_polling(types.contains(EventType::WINDOW_FOCUS));
    window.set_iconify_polling(types.contains(EventType::WINDOW_ICONIFY));
    window.set_maximize_polling(types.contains(EventType::WINDOW_MAXIMIZE));
    window.set_framebuffer_size_polling(types.contains(EventType::FRAMEBUFFER_SIZE));
    window.set_content_scale_polling(types.contains(EventType::CONTENT_SCALE));
    window.set_char_polling(types.contains(EventType::CHAR));
    window.set_char_mods_polling(types.contains(EventType::CHAR_MODS));
    window.set_cursor_enter_polling(types.contains(EventType::CURSOR_ENTER));
    window.set_cursor_pos_polling(types.contains(EventType::CURSOR_POSITION));
    window.set_drag_and_drop_polling(types.contains(EventType::DROP));
    window.set_key_polling(types.contains(EventType::KEY));
    window.set_mouse_button_polling(types.contains(EventType::MOUSE_BUTTON));
    window.set_scroll_polling(types.contains(EventType::SCROLL));
}

fn translate_modifiers(mods: glfw::Modifiers) -> Modifiers {
    Modifiers::from_bits_truncate(u32::try_from(mods.bits()).unwrap_or(0))
}

const fn translate_action(action: glfw::Action) -> Action {
    match action {
        glfw::Action::Press => Action::Press,
        glfw::Action::Release => Action::Release,
        glfw::Action::Repeat => Action::Repeat,
    }
}

fn translate_event(event: WindowEvent) -> Option<EventKind> {
    let kind = match event {
        WindowEvent::Pos(x, y) => EventKind::WindowPosition { x, y },
        WindowEvent::Size(width, height) => EventKind::WindowSize { width, height },
        WindowEvent::Close => EventKind::WindowClose,
        WindowEvent::Refresh => EventKind::WindowRefresh,
        WindowEvent::Focus(focused) => EventKind::WindowFocus(focused),
        WindowEvent::Iconify(iconified) => EventKind::WindowIconify(iconified),
        WindowEvent::Maximize(maximized) => EventKind::WindowMaximize(maximized),
        WindowEvent::FramebufferSize(width, height) => EventKind::FramebufferSize { width, height },
        WindowEvent::ContentScale(x, y) => EventKind::ContentScale { x, y },
        WindowEvent::Char(c) => EventKind::Char(c),
        WindowEvent::CharModifiers(codepoint, mods) => EventKind::CharMods {
            codepoint,
            mods: translate_modifiers(mods),
        },
        WindowEvent::CursorEnter(entered) => EventKind::CursorEnter(entered),
        WindowEvent::CursorPos(x, y) => EventKind::CursorPosition { x, y },
        WindowEvent::FileDrop(paths) => EventKind::FileDrop(paths),
        WindowEvent::Key(key, scancode, action, mods) => EventKind::Key {
            key: KeyCode(key as i32),
            scancode,
            action: translate_action(action),
            mods: translate_modifiers(mods),
        },
        WindowEvent::MouseButton(button, action, mods) => EventKind::MouseButton {
            button: MouseButton::from_index(u8::try_from(button as i32).unwrap_or(u8::MAX)),
            action: translate_action(action),
            mods: translate_modifiers(mods),
        },
        WindowEvent::Scroll(x, y) => EventKind::Scroll { x, y },
        _ => return None,
    };
    Some(kind)
}

impl WindowSystem for GlfwSystem {
    fn create_surface(&mut self, descriptor: &WindowDescriptor, share: Option<NativeHandle>) -> WindowResult<Surface> {
        self.apply_hints(descriptor);

        let share_window = match share {
            Some(handle) => Some(
                self.windows
                    .get(&handle)
                    .map(|native| &native.window)
                    .ok_or_else(|| WindowError::CreationFailed(format!("unknown share window {handle}")))?,
            ),
            None => None,
        };
        let created = match descriptor.monitor {
            None => open_window(&mut self.glfw, share_window, descriptor, WindowMode::Windowed),
            Some(Monitor::Primary) => self.glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(WindowMode::Windowed, |m| WindowMode::FullScreen(m));
                open_window(glfw, share_window, descriptor, mode)
            }),
            Some(Monitor::Connected(index)) => self.glfw.with_connected_monitors(|glfw, monitors| {
                let mode = monitors.get(index).map_or(WindowMode::Windowed, |m| WindowMode::FullScreen(m));
                open_window(glfw, share_window, descriptor, mode)
            }),
        };
        let (mut window, events) =
            created.ok_or_else(|| WindowError::CreationFailed(format!("GLFW refused window \"{}\"", descriptor.title)))?;

        enable_polling(&mut window, descriptor.event_types);

        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        let context = Arc::new(GlfwContext {
            context: Mutex::new(window.render_context()),
        });
        self.windows.insert(handle, NativeWindow { window, events });
        Ok(Surface { handle, context })
    }

    fn destroy_surface(&mut self, handle: NativeHandle) {
        self.windows.remove(&handle);
    }

    fn poll_events(&mut self) -> Vec<SystemEvent> {
        self.glfw.poll_events();
        self.collect_events()
    }

    fn wait_events(&mut self) -> Vec<SystemEvent> {
        self.glfw.wait_events();
        self.collect_events()
    }

    fn wait_events_timeout(&mut self, timeout: f64) -> Vec<SystemEvent> {
        self.glfw.wait_events_timeout(timeout);
        self.collect_events()
    }

    fn waker(&self) -> Arc<dyn EventWaker> {
        Arc::new(GlfwWaker)
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.glfw.set_swap_interval(glfw::SwapInterval::Sync(interval));
    }

    fn size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        Ok(self.window(handle)?.get_size())
    }

    fn set_size(&mut self, handle: NativeHandle, width: i32, height: i32) -> WindowResult<()> {
        self.window_mut(handle)?.set_size(width, height);
        Ok(())
    }

    fn position(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        Ok(self.window(handle)?.get_pos())
    }

    fn set_position(&mut self, handle: NativeHandle, x: i32, y: i32) -> WindowResult<()> {
        self.window_mut(handle)?.set_pos(x, y);
        Ok(())
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        Ok(self.window(handle)?.get_framebuffer_size())
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) -> WindowResult<()> {
        self.window_mut(handle)?.set_title(title);
        Ok(())
    }

    fn set_visible(&mut self, handle: NativeHandle, visible: bool) -> WindowResult<()> {
        let window = self.window_mut(handle)?;
        if visible {
            window.show();
        } else {
            window.hide();
        }
        Ok(())
    }

    fn iconify(&mut self, handle: NativeHandle) -> WindowResult<()> {
        self.window_mut(handle)?.iconify();
        Ok(())
    }

    fn restore(&mut self, handle: NativeHandle) -> WindowResult<()> {
        self.window_mut(handle)?.restore();
        Ok(())
    }

    fn cursor_position(&self, handle: NativeHandle) -> WindowResult<(f64, f64)> {
        Ok(self.window(handle)?.get_cursor_pos())
    }

    fn set_cursor_position(&mut self, handle: NativeHandle, x: f64, y: f64) -> WindowResult<()> {
        self.window_mut(handle)?.set_cursor_pos(x, y);
        Ok(())
    }

    fn set_input_mode(&mut self, handle: NativeHandle, mode: InputMode) -> WindowResult<()> {
        let window = self.window_mut(handle)?;
        match mode {
            InputMode::Cursor(cursor) => window.set_cursor_mode(match cursor {
                CursorMode::Normal => glfw::CursorMode::Normal,
                CursorMode::Hidden => glfw::CursorMode::Hidden,
                CursorMode::Disabled => glfw::CursorMode::Disabled,
            }),
            InputMode::StickyKeys(enabled) => window.set_sticky_keys(enabled),
            InputMode::StickyMouseButtons(enabled) => window.set_sticky_mouse_buttons(enabled),
        }
        Ok(())
    }

    fn clipboard(&self, handle: NativeHandle) -> WindowResult<Option<String>> {
        Ok(self.window(handle)?.get_clipboard_string())
    }

    fn set_clipboard(&mut self, handle: NativeHandle, text: &str) -> WindowResult<()> {
        self.window_mut(handle)?.set_clipboard_string(text);
        Ok(())
    }
}
