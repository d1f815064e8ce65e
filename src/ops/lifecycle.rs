//! Lifecycle operators: the `do_on_*` / `do_after_*` side-effect family.
//!
//! Every operator here wraps the downstream observer in a [`PeekObserver`]
//! which runs a hook at a fixed point of the signal sequence and then
//! forwards the signal unchanged.
//!
//! | Operator | Runs | A panicking hook |
//! |---|---|---|
//! | `do_on_subscribe` | before `on_subscribe` is forwarded | disposes upstream, fails downstream |
//! | `do_on_success` | before `on_success` | turns the success into an error |
//! | `do_on_error` | before `on_error` | is composed with the original error |
//! | `do_on_event` | before either terminal | as `do_on_success` / `do_on_error` |
//! | `do_on_terminate` | before either terminal | as `do_on_success` / `do_on_error` |
//! | `do_after_success` | after `on_success` | goes to the fallback sink |
//! | `do_after_terminate` | after either terminal | goes to the fallback sink |
//! | `do_on_dispose` | when disposed before terminating | goes to the fallback sink |

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  disposable::{self, Disposable, DisposableRef},
  error::{catch_callback, Result, RxError},
  observer::{BaseObserver, SingleObserver},
  plugins, Single,
};

type Action = Arc<dyn Fn() + Send + Sync>;
type Peek<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct Hooks<T> {
  on_subscribe: Option<Peek<DisposableRef>>,
  on_success: Option<Peek<T>>,
  on_error: Option<Peek<RxError>>,
  on_terminate: Option<Action>,
  after_success: Option<(Peek<T>, fn(&T) -> T)>,
  after_terminate: Option<Action>,
  on_dispose: Option<Action>,
}

impl<T> Default for Hooks<T> {
  fn default() -> Self {
    Self {
      on_subscribe: None,
      on_success: None,
      on_error: None,
      on_terminate: None,
      after_success: None,
      after_terminate: None,
      on_dispose: None,
    }
  }
}

/// Runs a hook whose failure can no longer reach the downstream.
fn run_detached(hook: impl FnOnce()) {
  if let Err(err) = catch_callback(hook) {
    plugins::on_error(err);
  }
}

pub struct PeekObserver<T> {
  observer: Arc<dyn SingleObserver<T>>,
  hooks: Arc<Hooks<T>>,
  // Set by the first terminal signal, or by a dispose while `on_dispose`
  // is installed.
  done: Arc<AtomicBool>,
}

impl<T> PeekObserver<T> {
  fn after_terminate(&self) {
    if let Some(hook) = &self.hooks.after_terminate {
      run_detached(|| hook());
    }
  }

  fn fail(&self, err: RxError) {
    self.observer.on_error(err);
    self.after_terminate();
  }
}

impl<T: Send + 'static> BaseObserver for PeekObserver<T> {
  fn on_subscribe(&self, d: DisposableRef) {
    if let Some(hook) = &self.hooks.on_subscribe {
      if let Err(err) = catch_callback(|| hook(&d)) {
        self.done.store(true, Ordering::Release);
        d.dispose();
        self.observer.on_subscribe(disposable::disposed());
        self.observer.on_error(err);
        return;
      }
    }
    let d: DisposableRef = match &self.hooks.on_dispose {
      Some(action) => {
        Arc::new(DisposeHook { upstream: d, action: action.clone(), done: self.done.clone() })
      }
      None => d,
    };
    self.observer.on_subscribe(d);
  }

  fn on_error(&self, mut err: RxError) {
    if self.done.swap(true, Ordering::AcqRel) {
      plugins::on_error(err);
      return;
    }
    if let Some(hook) = &self.hooks.on_error {
      if let Err(hook_err) = catch_callback(|| hook(&err)) {
        err = err.compose(hook_err);
      }
    }
    if let Some(hook) = &self.hooks.on_terminate {
      if let Err(hook_err) = catch_callback(|| hook()) {
        err = err.compose(hook_err);
      }
    }
    self.fail(err);
  }
}

impl<T: Send + 'static> SingleObserver<T> for PeekObserver<T> {
  fn on_success(&self, value: T) {
    if self.done.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Some(hook) = &self.hooks.on_success {
      if let Err(err) = catch_callback(|| hook(&value)) {
        return self.fail(err);
      }
    }
    if let Some(hook) = &self.hooks.on_terminate {
      if let Err(err) = catch_callback(|| hook()) {
        return self.fail(err);
      }
    }
    let after_success = self.hooks.after_success.as_ref().map(|(hook, copy)| (hook, copy(&value)));
    self.observer.on_success(value);
    if let Some((hook, value)) = after_success {
      run_detached(|| hook(&value));
    }
    self.after_terminate();
  }
}

/// The handle passed downstream by `do_on_dispose`.
struct DisposeHook {
  upstream: DisposableRef,
  action: Action,
  done: Arc<AtomicBool>,
}

impl Disposable for DisposeHook {
  fn dispose(&self) {
    if !self.done.swap(true, Ordering::AcqRel) {
      run_detached(|| (self.action)());
    }
    self.upstream.dispose();
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.upstream.is_disposed() }
}

impl<T: Send + 'static> Single<T> {
  fn peek(&self, name: &'static str, hooks: Hooks<T>) -> Self {
    let source = self.clone();
    let hooks = Arc::new(hooks);
    Self::operator(name, move |observer| {
      source.subscribe(Arc::new(PeekObserver {
        observer,
        hooks: hooks.clone(),
        done: Arc::new(AtomicBool::new(false)),
      }));
    })
  }

  /// Call `hook` with the upstream handle before the downstream sees it.
  pub fn do_on_subscribe<F>(&self, hook: F) -> Self
  where
    F: Fn(&DisposableRef) + Send + Sync + 'static,
  {
    self.peek("do_on_subscribe", Hooks { on_subscribe: Some(Arc::new(hook)), ..Default::default() })
  }

  pub fn do_on_success<F>(&self, hook: F) -> Self
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    self.peek("do_on_success", Hooks { on_success: Some(Arc::new(hook)), ..Default::default() })
  }

  /// A panic in `hook` is delivered together with the original error as
  /// [`RxError::Composite`].
  pub fn do_on_error<F>(&self, hook: F) -> Self
  where
    F: Fn(&RxError) + Send + Sync + 'static,
  {
    self.peek("do_on_error", Hooks { on_error: Some(Arc::new(hook)), ..Default::default() })
  }

  /// Call `hook` with the outcome, before it goes downstream.
  pub fn do_on_event<F>(&self, hook: F) -> Self
  where
    F: Fn(Result<&T, &RxError>) + Send + Sync + 'static,
  {
    let hook = Arc::new(hook);
    let c_hook = hook.clone();
    self.peek(
      "do_on_event",
      Hooks {
        on_success: Some(Arc::new(move |v: &T| hook(Ok(v)))),
        on_error: Some(Arc::new(move |e: &RxError| c_hook(Err(e)))),
        ..Default::default()
      },
    )
  }

  /// Run `action` right before either terminal signal.
  pub fn do_on_terminate<F>(&self, action: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    let hooks = Hooks { on_terminate: Some(Arc::new(action)), ..Default::default() };
    self.peek("do_on_terminate", hooks)
  }

  /// Call `hook` with a copy of the value once the downstream handled it.
  pub fn do_after_success<F>(&self, hook: F) -> Self
  where
    T: Clone,
    F: Fn(&T) + Send + Sync + 'static,
  {
    let after_success: (Peek<T>, fn(&T) -> T) = (Arc::new(hook), T::clone);
    let hooks = Hooks { after_success: Some(after_success), ..Default::default() };
    self.peek("do_after_success", hooks)
  }

  pub fn do_after_terminate<F>(&self, action: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.peek(
      "do_after_terminate",
      Hooks { after_terminate: Some(Arc::new(action)), ..Default::default() },
    )
  }

  /// Run `action` if the downstream disposes before a terminal signal.
  pub fn do_on_dispose<F>(&self, action: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.peek("do_on_dispose", Hooks { on_dispose: Some(Arc::new(action)), ..Default::default() })
  }
}
