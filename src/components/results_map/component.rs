use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::render;
use super::state::ResultsMapState;
use crate::map::ResultsMapData;

type SharedState = Rc<RefCell<Option<ResultsMapState>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

/// Client coordinates relative to the canvas.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

fn pointer_down(state: &SharedState, x: f64, y: f64) {
	if let Some(ref mut s) = *state.borrow_mut() {
		if let Some(id) = s.bubble_at_position(x, y)
			&& s.begin_drag(id, x, y)
		{
			return;
		}
		s.pan.active = true;
		s.pan.start_x = x;
		s.pan.start_y = y;
		s.pan.transform_start_x = s.transform.x;
		s.pan.transform_start_y = s.transform.y;
	}
}

fn pointer_move(state: &SharedState, x: f64, y: f64) {
	if let Some(ref mut s) = *state.borrow_mut() {
		if s.drag.active {
			s.drag_to(x, y);
		} else if s.pan.active {
			s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
			s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
		} else {
			let hovered = s.bubble_at_position(x, y);
			s.set_hover(hovered);
		}
	}
}

/// Ends any drag and pushes a moved bubble back into the map signal.
fn pointer_up(state: &SharedState, data: RwSignal<ResultsMapData>) {
	let moved = match *state.borrow_mut() {
		Some(ref mut s) => s.end_drag().then(|| s.data.clone()),
		None => None,
	};
	if let Some(updated) = moved {
		debug!("bubble moved, storing position");
		data.set(updated);
	}
}

/// Canvas view of a results map. Bubbles can be dragged inside their
/// region, the view pans with the background and zooms with the wheel.
#[component]
pub fn ResultsMapCanvas(
	data: RwSignal<ResultsMapData>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas has no 2d context");
			return;
		};
		*state_init.borrow_mut() = Some(ResultsMapState::new(data.get_untracked(), w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// edits made elsewhere reach the canvas through the signal
	let state_sync = state.clone();
	Effect::new(move |_| {
		let current = data.get();
		if let Some(ref mut s) = *state_sync.borrow_mut()
			&& !s.drag.active
			&& s.data != current
		{
			s.sync(current);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) {
			pointer_down(&state_md, x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) {
			pointer_move(&state_mm, x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| pointer_up(&state_mu, data);

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		pointer_up(&state_ml, data);
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.set_hover(None);
		}
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, touch.client_x(), touch.client_y()) {
			pointer_down(&state_ts, x, y);
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, touch.client_x(), touch.client_y()) {
			pointer_move(&state_tm, x, y);
		}
	};

	let state_te = state.clone();
	let on_touchend = move |_: TouchEvent| pointer_up(&state_te, data);

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.05, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="results-map-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:wheel=on_wheel
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
