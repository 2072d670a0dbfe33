pub fn hart_id() -> usize {
    0
}

pub fn park() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
