use arch::hart::hart_id;
use driver::print;
use logger::LogInterface;

struct LogInterfaceImpl;

#[crate_interface::impl_interface]
impl LogInterface for LogInterfaceImpl {
    fn print_log(record: &log::Record) {
        print!(
            "\u{1B}[{}m[{:>5}][hart {}] {}\u{1B}[0m\n",
            logger::level2color(record.level()),
            record.level(),
            hart_id(),
            record.args()
        );
    }
}
