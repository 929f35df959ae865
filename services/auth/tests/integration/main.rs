mod otp_test;
