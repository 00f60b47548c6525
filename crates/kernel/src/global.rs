use core::cell::UnsafeCell;

/// Minimal wrapper to store non-`Sync` types in statics.
///
/// Safety: callers must guarantee exclusive access when mutating. The kernel
/// runs on a single hart and traps never return into kernel code that holds
/// a reference, which is what makes this sound in practice.
pub struct Global<T> {
    inner: UnsafeCell<T>,
}

impl<T> Global<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    /// # Safety
    /// Callers must ensure exclusive access or otherwise serialize mutations.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.inner.get() }
    }

    /// Raw pointer for code that must not hold a reference across a context
    /// switch (see `sched::yield_now`).
    pub const fn as_ptr(&self) -> *mut T {
        self.inner.get()
    }
}

unsafe impl<T> Sync for Global<T> {}

#[cfg(test)]
mod tests {
    use super::Global;

    static COUNTER: Global<u32> = Global::new(0);

    #[test]
    fn pointer_and_reference_alias_same_cell() {
        unsafe {
            *COUNTER.get_mut() += 2;
            *COUNTER.as_ptr() += 3;
            assert_eq!(*COUNTER.get_mut(), 5);
        }
    }
}
